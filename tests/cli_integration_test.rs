//! CLI integration tests for the simulate pipeline.
//!
//! Tests cover:
//! - Config parsing (build_simulation_parameters, build_indicator_specs, ...)
//! - Full pipeline with MockIndicatorSource
//! - Full pipeline over real CSV files on disk
//! - Report, CSV and JSON exports
//! - Run history round trip through SQLite

mod common;

use approx::assert_relative_eq;
use capsim::adapters::file_config_adapter::FileConfigAdapter;
use capsim::cli;
use capsim::domain::blender::BlendPolicy;
use capsim::domain::error::CapsimError;
use capsim::domain::series::IndicatorKind;
use capsim::domain::statistics::{StdevKind, VolatilityScale};
use capsim::domain::timeline::StartPolicy;
use capsim::ports::indicator_port::IndicatorSource;
use common::*;
use std::fs;
use tempfile::TempDir;

const VALID_INI: &str = r#"
[simulation]
initial_capital = 10000.0
monthly_contribution = 0
monthly_withdrawal = 0
reinvest_withdrawals = false
start_date = 2024-01-01
end_date = 2024-04-30
start_policy = explicit

[blend]
denominator = configured

[statistics]
risk_free_rate = 0
volatility = annualized
stdev = population

[indicators]
names = CDI

[indicator.CDI]
kind = rate
source = cdi
"#;

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

/// Writes `cdi.csv` and `ibov.csv` into a fresh directory.
fn data_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("cdi.csv"),
        "date,value\n2024-01-02,1.0\n2024-02-01,1.0\n2024-03-01,1.0\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("ibov.csv"),
        "date;close\n31/01/2024;100,0\n29/02/2024;110,0\n28/03/2024;99,0\n",
    )
    .unwrap();
    dir
}

fn ini_with_data(dir: &TempDir, extra: &str) -> String {
    format!(
        "{VALID_INI}\n[data]\npath = {}\n{extra}",
        dir.path().display()
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn load_config_from_file() {
        let file = write_temp_ini(VALID_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let params = cli::build_simulation_parameters(&adapter).unwrap();
        assert_relative_eq!(params.initial_capital, 10_000.0);
    }

    #[test]
    fn load_config_missing_file_exits_with_config_code() {
        let code = cli::load_config(std::path::Path::new("/nonexistent/capsim.ini"))
            .err()
            .unwrap();
        assert_eq!(
            format!("{code:?}"),
            format!("{:?}", std::process::ExitCode::from(2))
        );
    }

    #[test]
    fn simulation_parameters_from_ini() {
        let params = cli::build_simulation_parameters(&config(VALID_INI)).unwrap();
        assert_eq!(params.start_date, date(2024, 1, 1));
        assert_eq!(params.end_date, date(2024, 4, 30));
        assert_eq!(params.start_policy, StartPolicy::Explicit);
        assert!(!params.reinvest_withdrawals);
    }

    #[test]
    fn start_policy_defaults_to_earliest_indicator() {
        let ini = VALID_INI.replace("start_policy = explicit\n", "");
        let params = cli::build_simulation_parameters(&config(&ini)).unwrap();
        assert_eq!(params.start_policy, StartPolicy::EarliestIndicator);
    }

    #[test]
    fn missing_end_date_is_config_missing() {
        let ini = VALID_INI.replace("end_date = 2024-04-30\n", "");
        let err = cli::build_simulation_parameters(&config(&ini)).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigMissing { ref key, .. } if key == "end_date"));
    }

    #[test]
    fn blend_policy_and_statistics() {
        let adapter = config(
            "[blend]\ndenominator = resolved_only\n[statistics]\nrisk_free_rate = 10.5\nvolatility = monthly\nstdev = sample\n",
        );
        assert_eq!(
            cli::build_blend_policy(&adapter).unwrap(),
            BlendPolicy::ResolvedOnly
        );
        let stats = cli::build_statistics_config(&adapter).unwrap();
        assert_relative_eq!(stats.risk_free_rate_pct, 10.5);
        assert_eq!(stats.volatility_scale, VolatilityScale::Monthly);
        assert_eq!(stats.stdev_kind, StdevKind::Sample);
    }

    #[test]
    fn unknown_blend_policy_rejected() {
        let err = cli::build_blend_policy(&config("[blend]\ndenominator = median\n")).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigInvalid { ref key, .. } if key == "denominator"));
    }

    #[test]
    fn indicator_specs_keep_configured_order() {
        let adapter = config(
            r#"
[indicators]
names = IBOV, CDI

[indicator.IBOV]
kind = price
source = ibov

[indicator.CDI]
kind = rate
source = bcb_12
date_column = data
value_column = valor
"#,
        );
        let specs = cli::build_indicator_specs(&adapter).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "IBOV");
        assert_eq!(specs[0].kind, IndicatorKind::Price);
        assert_eq!(specs[0].value_column, "close");
        assert_eq!(specs[1].source_id, "bcb_12");
        assert_eq!(specs[1].date_column, "data");
        assert_eq!(specs[1].value_column, "valor");
    }

    #[test]
    fn indicator_without_kind_is_config_missing() {
        let adapter = config("[indicators]\nnames = CDI\n[indicator.CDI]\nsource = cdi\n");
        let err = cli::build_indicator_specs(&adapter).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigMissing { ref key, .. } if key == "kind"));
    }

    #[test]
    fn named_delimiter_accepted() {
        let adapter = config("[data]\npath = /tmp\ndelimiter = semicolon\n");
        assert!(cli::build_csv_adapter(&adapter).is_ok());

        let bad = config("[data]\ndelimiter = ::\n");
        assert!(matches!(
            cli::build_csv_adapter(&bad),
            Err(CapsimError::ConfigInvalid { .. })
        ));
    }
}

mod pipeline_with_mock {
    use super::*;

    #[test]
    fn one_percent_end_to_end() {
        let source = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1), (2024, 2), (2024, 3)], 1.0));
        let outcome = cli::run_simulation_pipeline(&source, &config(VALID_INI)).unwrap();

        assert_eq!(outcome.run.ledger.len(), 4);
        assert_relative_eq!(outcome.summary.final_balance, 10_303.01, epsilon = 1e-6);
        assert_relative_eq!(outcome.summary.total_return_pct, 3.0301, epsilon = 1e-9);
        assert_eq!(outcome.indicators.len(), 1);
    }

    #[test]
    fn invalid_config_stops_before_loading() {
        let ini = VALID_INI.replace("initial_capital = 10000.0", "initial_capital = 0");
        let source = MockIndicatorSource::new().with_error("cdi", "must not be called");
        let err = cli::run_simulation_pipeline(&source, &config(&ini)).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigInvalid { ref key, .. } if key == "initial_capital"));
    }

    #[test]
    fn non_numeric_flows_are_rejected() {
        let ini = VALID_INI
            .replace("monthly_contribution = 0", "monthly_contribution = 500,00")
            .replace("monthly_withdrawal = 0", "monthly_withdrawal = abc");
        let source = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1)], 0.0));
        let err = cli::run_simulation_pipeline(&source, &config(&ini)).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigInvalid { ref key, .. } if key == "monthly_withdrawal"));
    }

    #[test]
    fn decimal_comma_contribution_is_applied() {
        let ini = VALID_INI.replace("monthly_contribution = 0", "monthly_contribution = 100,50");
        let source = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1)], 0.0));
        let outcome = cli::run_simulation_pipeline(&source, &config(&ini)).unwrap();
        assert_relative_eq!(outcome.summary.total_contributed, 301.5, epsilon = 1e-9);
    }

    #[test]
    fn unrecognized_reinvest_flag_is_rejected() {
        let ini = VALID_INI.replace("reinvest_withdrawals = false", "reinvest_withdrawals = maybe");
        let err = cli::build_simulation_parameters(&config(&ini)).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigInvalid { ref key, .. } if key == "reinvest_withdrawals"));
    }

    #[test]
    fn source_error_aborts_run() {
        let source = MockIndicatorSource::new().with_error("cdi", "timeout");
        let err = cli::run_simulation_pipeline(&source, &config(VALID_INI)).unwrap_err();
        assert!(matches!(err, CapsimError::Database { .. }));
    }

    #[test]
    fn no_indicators_gives_flat_run() {
        let ini = VALID_INI.replace("names = CDI", "names =");
        let outcome =
            cli::run_simulation_pipeline(&MockIndicatorSource::new(), &config(&ini)).unwrap();
        assert!(outcome.run.indicator_names.is_empty());
        assert_relative_eq!(outcome.summary.total_return_pct, 0.0);
        assert_relative_eq!(outcome.summary.volatility_pct, 0.0);
    }

    #[test]
    fn contributions_flow_into_summary() {
        let ini = VALID_INI
            .replace("monthly_contribution = 0", "monthly_contribution = 100")
            .replace("monthly_withdrawal = 0", "monthly_withdrawal = 40");
        let source = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1)], 0.0));
        let outcome = cli::run_simulation_pipeline(&source, &config(&ini)).unwrap();

        assert_relative_eq!(outcome.summary.total_contributed, 300.0);
        assert_relative_eq!(outcome.summary.total_withdrawn, 120.0);
        assert_relative_eq!(outcome.summary.final_balance, 10_180.0, epsilon = 1e-9);
    }
}

mod pipeline_with_csv {
    use super::*;

    #[test]
    fn csv_sources_listed() {
        let dir = data_dir();
        let adapter = config(&ini_with_data(&dir, ""));
        let source = cli::build_csv_adapter(&adapter).unwrap();
        assert_eq!(
            source.list_sources().unwrap(),
            vec!["cdi".to_string(), "ibov".to_string()]
        );
    }

    #[test]
    fn rate_csv_end_to_end() {
        let dir = data_dir();
        let adapter = config(&ini_with_data(&dir, ""));
        let source = cli::build_csv_adapter(&adapter).unwrap();
        let outcome = cli::run_simulation_pipeline(&source, &adapter).unwrap();
        assert_relative_eq!(outcome.summary.final_balance, 10_303.01, epsilon = 1e-6);
    }

    #[test]
    fn missing_csv_file_is_database_error() {
        let dir = TempDir::new().unwrap();
        let adapter = config(&ini_with_data(&dir, ""));
        let source = cli::build_csv_adapter(&adapter).unwrap();
        let err = cli::run_simulation_pipeline(&source, &adapter).unwrap_err();
        assert!(matches!(err, CapsimError::Database { .. }));
    }

    #[test]
    fn semicolon_price_file_blends_with_rate() {
        let dir = data_dir();
        // Only the price file is semicolon-separated.
        let ini = VALID_INI
            .replace("names = CDI", "names = IBOV")
            .replace("end_date = 2024-04-30", "end_date = 2024-03-31")
            .replace("[indicator.CDI]\nkind = rate\nsource = cdi", "[indicator.IBOV]\nkind = price\nsource = ibov");
        let adapter = config(&format!(
            "{ini}\n[data]\npath = {}\ndelimiter = semicolon\n",
            dir.path().display()
        ));
        let source = cli::build_csv_adapter(&adapter).unwrap();
        let outcome = cli::run_simulation_pipeline(&source, &adapter).unwrap();

        let returns: Vec<f64> = outcome
            .run
            .ledger
            .iter()
            .map(|r| r.period_return_pct)
            .collect();
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(returns[2], -10.0, epsilon = 1e-9);
        assert_relative_eq!(outcome.summary.final_balance, 9_900.0, epsilon = 1e-6);
    }
}

mod exports {
    use super::*;
    use capsim::adapters::ledger_export::{CsvLedgerExporter, JsonLedgerExporter};
    use capsim::adapters::typst_report::TypstReportExporter;
    use capsim::ports::export_port::LedgerExportPort;

    fn outcome() -> cli::SimulationOutcome {
        let source = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1), (2024, 2), (2024, 3)], 1.0));
        cli::run_simulation_pipeline(&source, &config(VALID_INI)).unwrap()
    }

    #[test]
    fn typst_report_has_no_unresolved_placeholders() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.typ");

        TypstReportExporter::new()
            .with_title("Quarterly CDI")
            .with_indicators(&outcome.indicators)
            .export(&outcome.run, &outcome.summary, &path)
            .unwrap();

        let markup = fs::read_to_string(&path).unwrap();
        assert!(markup.contains("Quarterly CDI"));
        assert!(markup.contains("CDI"));
        assert!(!markup.contains("{{TITLE}}"));
        assert!(!markup.contains("{{LEDGER_TABLE}}"));
    }

    #[test]
    fn custom_template_is_used() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let template = dir.path().join("custom.typ");
        fs::write(&template, "= {{TITLE}}\n{{SUMMARY_TABLE}}\n").unwrap();
        let path = dir.path().join("out.typ");

        TypstReportExporter::new()
            .with_template(&template)
            .export(&outcome.run, &outcome.summary, &path)
            .unwrap();

        let markup = fs::read_to_string(&path).unwrap();
        assert!(markup.starts_with("= Portfolio Simulation Report"));
        assert!(!markup.contains("{{SUMMARY_TABLE}}"));
    }

    #[test]
    fn missing_template_is_export_error() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let err = TypstReportExporter::new()
            .with_template(dir.path().join("nope.typ"))
            .export(&outcome.run, &outcome.summary, &dir.path().join("out.typ"))
            .unwrap_err();
        assert!(matches!(err, CapsimError::Export { .. }));
    }

    #[test]
    fn csv_ledger_has_one_row_per_month() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");

        CsvLedgerExporter::new()
            .export(&outcome.run, &outcome.summary, &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("date,"));
        assert!(lines[4].starts_with("2024-04-30,"));
    }

    #[test]
    fn ledger_csv_follows_data_delimiter() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.csv");
        let adapter = config(&format!("{VALID_INI}\n[data]\ndelimiter = semicolon\n"));

        cli::build_ledger_csv_exporter(&adapter)
            .unwrap()
            .export(&outcome.run, &outcome.summary, &path)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.lines().next().unwrap().starts_with("date;"));
        assert!(!content.contains(','));
    }

    #[test]
    fn json_document_carries_summary_and_ledger() {
        let outcome = outcome();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");

        JsonLedgerExporter
            .export(&outcome.run, &outcome.summary, &path)
            .unwrap();

        let doc: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["ledger"].as_array().unwrap().len(), 4);
        assert_eq!(doc["blend_policy"], "configured");
        assert_relative_eq!(
            doc["summary"]["final_balance"].as_f64().unwrap(),
            10_303.01,
            epsilon = 1e-6
        );
    }

    #[test]
    fn export_into_missing_directory_fails() {
        let outcome = outcome();
        let err = JsonLedgerExporter
            .export(
                &outcome.run,
                &outcome.summary,
                std::path::Path::new("/nonexistent/dir/run.json"),
            )
            .unwrap_err();
        assert!(matches!(err, CapsimError::Export { .. }));
    }
}

#[cfg(feature = "sqlite")]
mod history {
    use super::*;
    use capsim::adapters::sqlite_adapter::SqliteAdapter;
    use capsim::domain::history::{HistoryStatistics, NewRunRecord, RunComparison};
    use capsim::ports::history_port::RunHistoryPort;

    #[test]
    fn runs_round_trip_through_file_store() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("history.db");
        let adapter = config(&format!("{VALID_INI}\n[history]\npath = {}\n", db.display()));

        let store = SqliteAdapter::from_config(&adapter).unwrap();
        store.initialize_schema().unwrap();

        let flat = MockIndicatorSource::new().with_table("cdi", rate_table(&[(2024, 1)], 0.0));
        let growing = MockIndicatorSource::new()
            .with_table("cdi", rate_table(&[(2024, 1), (2024, 2), (2024, 3)], 1.0));

        let first = cli::run_simulation_pipeline(&flat, &adapter).unwrap();
        let second = cli::run_simulation_pipeline(&growing, &adapter).unwrap();
        let id_a = store
            .append(&NewRunRecord::from_run(&first.run, &first.summary))
            .unwrap();
        let id_b = store
            .append(&NewRunRecord::from_run(&second.run, &second.summary))
            .unwrap();
        assert!(id_b > id_a);

        let runs = store.list(None).unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].id, id_b);
        assert_eq!(runs[0].indicators, vec!["CDI".to_string()]);
        assert!(cli::format_run_line(&runs[0]).starts_with(&format!("#{id_b}")));

        let stats = HistoryStatistics::compute(&runs).unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.best_run_id, id_b);
        assert_eq!(stats.worst_run_id, id_a);

        let a = store.get(id_a).unwrap().unwrap();
        let b = store.get(id_b).unwrap().unwrap();
        let cmp = RunComparison::between(&a, &b);
        assert_relative_eq!(cmp.final_balance.delta, -303.01, epsilon = 1e-6);
        assert!(cli::format_comparison(&cmp).contains("Delta"));

        assert!(store.get(id_b + 100).unwrap().is_none());
    }

    #[test]
    fn store_requires_path() {
        let err = SqliteAdapter::from_config(&config(VALID_INI)).err().unwrap();
        assert!(matches!(err, CapsimError::ConfigMissing { ref section, .. } if section == "history"));
    }
}
