//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{parse_delimiter, CsvAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ledger_export::{CsvLedgerExporter, JsonLedgerExporter};
use crate::adapters::typst_report::TypstReportExporter;
use crate::domain::blender::BlendPolicy;
use crate::domain::config_validation::{
    indicator_section, parse_choice, parse_date, parse_flag, parse_number, unused_sections,
    validate_indicator_config,
    validate_simulation_config, validate_statistics_config,
};
use crate::domain::error::CapsimError;
use crate::domain::history::{HistoryStatistics, NewRunRecord, RunComparison, RunRecord};
use crate::domain::normalizer::{self, IndicatorSpec};
use crate::domain::series::{IndicatorKind, IndicatorSeries};
use crate::domain::simulation::{self, SimulationParameters, SimulationRun};
use crate::domain::statistics::{SimulationSummary, StatisticsConfig};
use crate::ports::config_port::ConfigPort;
use crate::ports::export_port::LedgerExportPort;
use crate::ports::history_port::RunHistoryPort;
use crate::ports::indicator_port::IndicatorSource;

#[derive(Parser, Debug)]
#[command(name = "capsim", about = "Monthly portfolio evolution simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        /// Typst report output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the ledger as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also write the run as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// Do not record the run in the history store
        #[arg(long)]
        no_history: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Normalize one indicator and describe it
    Inspect {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        indicator: String,
    },
    /// List source ids available in the data directory
    ListSources {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List recorded runs
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Compare two recorded runs
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        a: i64,
        b: i64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            output,
            csv,
            json,
            no_history,
        } => run_simulate(
            &config,
            output.as_deref(),
            csv.as_deref(),
            json.as_deref(),
            no_history,
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Inspect { config, indicator } => run_inspect(&config, &indicator),
        Command::ListSources { config } => run_list_sources(&config),
        Command::History { config, limit } => run_history(&config, limit),
        Command::Compare { config, a, b } => run_compare(&config, a, b),
    }
}

fn fail(e: CapsimError) -> ExitCode {
    eprintln!("error: {e}");
    (&e).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(CapsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

pub fn build_simulation_parameters(
    adapter: &dyn ConfigPort,
) -> Result<SimulationParameters, CapsimError> {
    Ok(SimulationParameters {
        initial_capital: parse_number(adapter, "simulation", "initial_capital", 0.0)?,
        monthly_contribution: parse_number(adapter, "simulation", "monthly_contribution", 0.0)?,
        monthly_withdrawal: parse_number(adapter, "simulation", "monthly_withdrawal", 0.0)?,
        reinvest_withdrawals: parse_flag(adapter, "simulation", "reinvest_withdrawals", false)?,
        start_date: parse_date(adapter, "start_date")?,
        end_date: parse_date(adapter, "end_date")?,
        start_policy: parse_choice(adapter, "simulation", "start_policy")?,
    })
}

pub fn build_blend_policy(adapter: &dyn ConfigPort) -> Result<BlendPolicy, CapsimError> {
    parse_choice(adapter, "blend", "denominator")
}

pub fn build_statistics_config(adapter: &dyn ConfigPort) -> Result<StatisticsConfig, CapsimError> {
    Ok(StatisticsConfig {
        risk_free_rate_pct: parse_number(adapter, "statistics", "risk_free_rate", 0.0)?,
        volatility_scale: parse_choice(adapter, "statistics", "volatility")?,
        stdev_kind: parse_choice(adapter, "statistics", "stdev")?,
    })
}

/// One spec per name in `[indicators] names`, in configured order.
pub fn build_indicator_specs(adapter: &dyn ConfigPort) -> Result<Vec<IndicatorSpec>, CapsimError> {
    adapter
        .get_list("indicators", "names")
        .iter()
        .map(|name| build_indicator_spec(adapter, name))
        .collect()
}

fn build_indicator_spec(adapter: &dyn ConfigPort, name: &str) -> Result<IndicatorSpec, CapsimError> {
    let section = indicator_section(name);

    let kind_str = adapter
        .get_string(&section, "kind")
        .ok_or_else(|| CapsimError::ConfigMissing {
            section: section.clone(),
            key: "kind".into(),
        })?;
    let kind: IndicatorKind = kind_str.parse().map_err(|reason| CapsimError::ConfigInvalid {
        section: section.clone(),
        key: "kind".into(),
        reason,
    })?;

    let source_id = adapter
        .get_string(&section, "source")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| CapsimError::ConfigMissing {
            section: section.clone(),
            key: "source".into(),
        })?;

    let defaults = match kind {
        IndicatorKind::Rate => IndicatorSpec::rate(name, source_id.trim()),
        IndicatorKind::Price => IndicatorSpec::price(name, source_id.trim()),
    };

    Ok(IndicatorSpec {
        date_column: adapter
            .get_string(&section, "date_column")
            .unwrap_or(defaults.date_column),
        value_column: adapter
            .get_string(&section, "value_column")
            .unwrap_or(defaults.value_column),
        ..defaults
    })
}

/// `[data] delimiter`, shared by indicator files and the ledger CSV.
pub fn build_csv_delimiter(adapter: &dyn ConfigPort) -> Result<u8, CapsimError> {
    let raw_delimiter = adapter
        .get_string("data", "delimiter")
        .unwrap_or_else(|| ",".to_string());
    parse_delimiter(&raw_delimiter).ok_or_else(|| CapsimError::ConfigInvalid {
        section: "data".into(),
        key: "delimiter".into(),
        reason: format!("unsupported delimiter '{raw_delimiter}'"),
    })
}

pub fn build_csv_adapter(adapter: &dyn ConfigPort) -> Result<CsvAdapter, CapsimError> {
    let base_path = adapter
        .get_string("data", "path")
        .unwrap_or_else(|| ".".to_string());
    let delimiter = build_csv_delimiter(adapter)?;

    Ok(CsvAdapter::new(PathBuf::from(base_path)).with_delimiter(delimiter))
}

pub fn build_ledger_csv_exporter(adapter: &dyn ConfigPort) -> Result<CsvLedgerExporter, CapsimError> {
    Ok(CsvLedgerExporter::new().with_delimiter(build_csv_delimiter(adapter)?))
}

/// Loads and normalizes every configured indicator, keyed by name.
pub fn load_indicators(
    source: &dyn IndicatorSource,
    specs: &[IndicatorSpec],
) -> Result<BTreeMap<String, IndicatorSeries>, CapsimError> {
    let mut indicators = BTreeMap::new();
    for spec in specs {
        let table = source.load(spec)?;
        let series = normalizer::normalize(&table, spec)?;
        tracing::info!(
            indicator = %spec.name,
            source = %spec.source_id,
            samples = series.len(),
            "indicator loaded"
        );
        indicators.insert(spec.name.clone(), series);
    }
    Ok(indicators)
}

/// Everything a simulation run produces.
#[derive(Debug)]
pub struct SimulationOutcome {
    pub indicators: BTreeMap<String, IndicatorSeries>,
    pub run: SimulationRun,
    pub summary: SimulationSummary,
}

/// Validates the config, loads indicators from `source`, runs the engine and
/// computes statistics. No files are written.
pub fn run_simulation_pipeline(
    source: &dyn IndicatorSource,
    adapter: &dyn ConfigPort,
) -> Result<SimulationOutcome, CapsimError> {
    validate_simulation_config(adapter)?;
    validate_statistics_config(adapter)?;
    validate_indicator_config(adapter)?;

    let params = build_simulation_parameters(adapter)?;
    let policy = build_blend_policy(adapter)?;
    let stats_config = build_statistics_config(adapter)?;
    let specs = build_indicator_specs(adapter)?;

    let indicators = load_indicators(source, &specs)?;
    let run = simulation::run_simulation(&params, &indicators, policy)?;
    let summary = SimulationSummary::compute(&run.ledger, &stats_config);

    Ok(SimulationOutcome {
        indicators,
        run,
        summary,
    })
}

pub fn print_summary(summary: &SimulationSummary) {
    eprintln!("\n=== Simulation Results ===");
    eprintln!("Final Balance:    {:.2}", summary.final_balance);
    eprintln!("Total Return:     {:.2}%", summary.total_return_pct);
    eprintln!("Annualized:       {:.2}%", summary.annualized_return_pct);
    eprintln!("Avg Monthly:      {:.4}%", summary.average_monthly_return_pct);
    eprintln!("Volatility:       {:.2}%", summary.volatility_pct);
    eprintln!("Sharpe-like:      {:.2}", summary.sharpe_like_ratio);
    eprintln!("Max Drawdown:     -{:.2}%", summary.max_drawdown_pct);
    eprintln!("Contributed:      {:.2}", summary.total_contributed);
    eprintln!("Withdrawn:        {:.2}", summary.total_withdrawn);
    eprintln!("Months:           {}", summary.months);
}

fn run_simulate(
    config_path: &Path,
    output_path: Option<&Path>,
    csv_path: Option<&Path>,
    json_path: Option<&Path>,
    no_history: bool,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Resolve data source
    let source = match build_csv_adapter(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    // Stages 3-5: Validate, load indicators, simulate, summarize
    let outcome = match run_simulation_pipeline(&source, &adapter) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    eprintln!(
        "Simulated {} months with {} indicator(s) ({} denominator)",
        outcome.summary.months,
        outcome.run.indicator_names.len(),
        outcome.run.blend_policy,
    );
    print_summary(&outcome.summary);

    // Stage 6: Exports
    let output = output_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("report.typ"));
    let mut report = TypstReportExporter::new().with_indicators(&outcome.indicators);
    if let Some(template) = adapter.get_string("report", "template_path") {
        report = report.with_template(template);
    }
    if let Some(title) = adapter.get_string("report", "title") {
        report = report.with_title(title);
    }

    let mut exports: Vec<(&dyn LedgerExportPort, PathBuf)> =
        vec![(&report as &dyn LedgerExportPort, output)];
    let csv_exporter = match build_ledger_csv_exporter(&adapter) {
        Ok(e) => e,
        Err(e) => return fail(e),
    };
    if let Some(path) = csv_path {
        exports.push((&csv_exporter, path.to_path_buf()));
    }
    if let Some(path) = json_path {
        exports.push((&JsonLedgerExporter, path.to_path_buf()));
    }

    for (exporter, path) in &exports {
        if let Err(e) = exporter.export(&outcome.run, &outcome.summary, path) {
            return fail(e);
        }
        eprintln!("Written: {}", path.display());
    }

    // Stage 7: History
    if no_history {
        return ExitCode::SUCCESS;
    }
    record_history(&adapter, &outcome)
}

#[cfg(feature = "sqlite")]
fn open_history(adapter: &dyn ConfigPort) -> Result<crate::adapters::sqlite_adapter::SqliteAdapter, CapsimError> {
    let store = crate::adapters::sqlite_adapter::SqliteAdapter::from_config(adapter)?;
    store.initialize_schema()?;
    Ok(store)
}

fn record_history(adapter: &dyn ConfigPort, outcome: &SimulationOutcome) -> ExitCode {
    if adapter.get_string("history", "path").is_none() {
        return ExitCode::SUCCESS;
    }

    #[cfg(feature = "sqlite")]
    {
        let store = match open_history(adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        match store.append(&NewRunRecord::from_run(&outcome.run, &outcome.summary)) {
            Ok(id) => {
                eprintln!("Recorded run #{id}");
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = outcome;
        eprintln!("warning: sqlite feature is disabled; run not recorded");
        ExitCode::SUCCESS
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let checks = [
        validate_simulation_config(&adapter),
        validate_statistics_config(&adapter),
        validate_indicator_config(&adapter),
    ];
    for check in checks {
        if let Err(e) = check {
            return fail(e);
        }
    }

    let specs = match build_indicator_specs(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    for section in unused_sections(&adapter.sections(), &specs) {
        eprintln!("warning: section [{section}] is not used");
    }

    let policy = build_blend_policy(&adapter).unwrap_or_default();
    eprintln!("\nBlend denominator: {policy}");
    eprintln!("\nIndicators:");
    if specs.is_empty() {
        eprintln!("  (none: every period will return 0%)");
    }

    let available = build_csv_adapter(&adapter).and_then(|s| s.list_sources()).ok();
    for spec in &specs {
        let status = match &available {
            Some(sources) if !sources.contains(&spec.source_id) => "  [source file not found]",
            _ => "",
        };
        eprintln!(
            "  {} ({}): source={} date={} value={}{}",
            spec.name, spec.kind, spec.source_id, spec.date_column, spec.value_column, status
        );
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_inspect(config_path: &Path, indicator: &str) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let specs = match build_indicator_specs(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let Some(spec) = specs
        .iter()
        .find(|s| s.name.eq_ignore_ascii_case(indicator))
    else {
        eprintln!("error: indicator '{indicator}' is not configured");
        return ExitCode::from(2);
    };

    let source = match build_csv_adapter(&adapter) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let table = match source.load(spec) {
        Ok(t) => t,
        Err(e) => return fail(e),
    };
    let (series, warnings) = match normalizer::normalize_with_warnings(&table, spec) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("{} ({}, source {})", spec.name, spec.kind, spec.source_id);
    println!("  raw rows:      {}", table.rows.len());
    println!("  samples:       {}", series.len());
    match (series.first_date(), series.last_date()) {
        (Some(first), Some(last)) => println!("  range:         {first} to {last}"),
        _ => println!("  range:         (empty)"),
    }
    match series.mean_value() {
        Some(mean) => println!("  mean (%):      {mean:.4}"),
        None => println!("  mean (%):      -"),
    }
    if !warnings.is_empty() {
        eprintln!("\n{} row(s) dropped:", warnings.len());
        for warning in &warnings {
            eprintln!("  {warning}");
        }
    }

    ExitCode::SUCCESS
}

fn run_list_sources(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let sources = match build_csv_adapter(&adapter).and_then(|s| s.list_sources()) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if sources.is_empty() {
        eprintln!("No sources found");
    } else {
        for source in &sources {
            println!("{source}");
        }
        eprintln!("{} sources found", sources.len());
    }
    ExitCode::SUCCESS
}

pub fn format_run_line(record: &RunRecord) -> String {
    format!(
        "#{:<4} {}  {} to {}  [{}]  final {:.2}  return {:.2}%  vol {:.2}%  sharpe {:.2}",
        record.id,
        record.created_at.format("%Y-%m-%d %H:%M"),
        record.parameters.start_date,
        record.parameters.end_date,
        record.indicators.join(","),
        record.summary.final_balance,
        record.summary.total_return_pct,
        record.summary.volatility_pct,
        record.summary.sharpe_like_ratio,
    )
}

pub fn format_comparison(cmp: &RunComparison) -> String {
    let mut out = format!(
        "{:<20} {:>14} {:>14} {:>14}\n",
        "Metric",
        format!("#{}", cmp.a_id),
        format!("#{}", cmp.b_id),
        "Delta"
    );
    for (label, m) in cmp.rows() {
        out.push_str(&format!(
            "{:<20} {:>14.2} {:>14.2} {:>+14.2}\n",
            label, m.a, m.b, m.delta
        ));
    }
    out
}

fn run_history(config_path: &Path, limit: Option<usize>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let store = match open_history(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };
        let records = match store.list(limit) {
            Ok(r) => r,
            Err(e) => return fail(e),
        };

        if records.is_empty() {
            eprintln!("No runs recorded");
            return ExitCode::SUCCESS;
        }
        for record in &records {
            println!("{}", format_run_line(record));
        }

        if let Some(stats) = HistoryStatistics::compute(&records) {
            eprintln!("\n=== History ({} runs) ===", stats.count);
            eprintln!("Mean Return:      {:.2}%", stats.mean_total_return_pct);
            eprintln!("Mean Volatility:  {:.2}%", stats.mean_volatility_pct);
            eprintln!("Mean Sharpe-like: {:.2}", stats.mean_sharpe_like_ratio);
            eprintln!("Mean Final:       {:.2}", stats.mean_final_balance);
            eprintln!("Best / Worst:     #{} / #{}", stats.best_run_id, stats.worst_run_id);
        }
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (adapter, limit);
        eprintln!("error: sqlite feature is required for history");
        ExitCode::from(1)
    }
}

fn run_compare(config_path: &Path, a: i64, b: i64) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let store = match open_history(&adapter) {
            Ok(s) => s,
            Err(e) => return fail(e),
        };

        let mut fetched = Vec::with_capacity(2);
        for id in [a, b] {
            match store.get(id) {
                Ok(Some(record)) => fetched.push(record),
                Ok(None) => {
                    eprintln!("error: run #{id} not found");
                    return ExitCode::from(3);
                }
                Err(e) => return fail(e),
            }
        }

        let cmp = RunComparison::between(&fetched[0], &fetched[1]);
        print!("{}", format_comparison(&cmp));
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = (adapter, a, b);
        eprintln!("error: sqlite feature is required for compare");
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::statistics::{StdevKind, VolatilityScale};
    use crate::domain::timeline::StartPolicy;
    use chrono::NaiveDate;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn builds_parameters_from_config() {
        let adapter = config(
            "[simulation]\ninitial_capital = 5000\nmonthly_contribution = 100\nreinvest_withdrawals = yes\nstart_date = 2021-01-01\nend_date = 2022-01-01\nstart_policy = explicit\n",
        );
        let params = build_simulation_parameters(&adapter).unwrap();
        assert_eq!(params.initial_capital, 5000.0);
        assert_eq!(params.monthly_contribution, 100.0);
        assert_eq!(params.monthly_withdrawal, 0.0);
        assert!(params.reinvest_withdrawals);
        assert_eq!(params.start_date, NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(params.start_policy, StartPolicy::Explicit);
    }

    #[test]
    fn start_policy_defaults_to_earliest_indicator() {
        let adapter = config("[simulation]\nstart_date = 2021-01-01\nend_date = 2022-01-01\n");
        let params = build_simulation_parameters(&adapter).unwrap();
        assert_eq!(params.start_policy, StartPolicy::EarliestIndicator);
    }

    #[test]
    fn builds_statistics_config() {
        let adapter = config("[statistics]\nrisk_free_rate = 10.5\nvolatility = monthly\nstdev = sample\n");
        let stats = build_statistics_config(&adapter).unwrap();
        assert_eq!(stats.risk_free_rate_pct, 10.5);
        assert_eq!(stats.volatility_scale, VolatilityScale::Monthly);
        assert_eq!(stats.stdev_kind, StdevKind::Sample);
    }

    #[test]
    fn builds_indicator_specs_with_defaults() {
        let adapter = config(
            "[indicators]\nnames = CDI, IBOV\n\n[indicator.CDI]\nkind = rate\nsource = bcb_12\ndate_column = data\nvalue_column = valor\n\n[indicator.IBOV]\nkind = price\nsource = ibov\n",
        );
        let specs = build_indicator_specs(&adapter).unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].name, "CDI");
        assert_eq!(specs[0].date_column, "data");
        assert_eq!(specs[0].value_column, "valor");
        assert_eq!(specs[1].kind, IndicatorKind::Price);
        assert_eq!(specs[1].date_column, "date");
        assert_eq!(specs[1].value_column, "close");
    }

    #[test]
    fn indicator_spec_requires_source() {
        let adapter = config("[indicators]\nnames = X\n\n[indicator.X]\nkind = rate\n");
        let err = build_indicator_specs(&adapter).unwrap_err();
        assert!(matches!(err, CapsimError::ConfigMissing { key, .. } if key == "source"));
    }

    #[test]
    fn csv_adapter_rejects_bad_delimiter() {
        let adapter = config("[data]\npath = .\ndelimiter = ::\n");
        assert!(build_csv_adapter(&adapter).is_err());
    }

    #[test]
    fn blend_policy_from_config() {
        let adapter = config("[blend]\ndenominator = resolved\n");
        assert_eq!(build_blend_policy(&adapter).unwrap(), BlendPolicy::ResolvedOnly);
    }

    #[test]
    fn comparison_formatting() {
        let mk = |id: i64, total: f64| RunRecord {
            id,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            parameters: build_simulation_parameters(&config(
                "[simulation]\ninitial_capital = 1\nstart_date = 2021-01-01\nend_date = 2022-01-01\n",
            ))
            .unwrap(),
            indicators: vec!["CDI".into()],
            summary: SimulationSummary {
                total_return_pct: total,
                ..SimulationSummary::default()
            },
        };
        let cmp = RunComparison::between(&mk(1, 12.0), &mk(2, 10.0));
        let out = format_comparison(&cmp);
        assert!(out.lines().next().unwrap().contains("#1"));
        assert!(out.contains("+2.00"));

        let line = format_run_line(&mk(3, 5.0));
        assert!(line.starts_with("#3"));
        assert!(line.contains("return 5.00%"));
    }
}
