//! Typst report generation.
//!
//! Orchestrates placeholder resolution: reads a Typst template (either the
//! built-in default or a custom file via `template_path`), resolves all
//! `{{PLACEHOLDER}}` markers by calling helpers from `chart_svg` and `tables`,
//! and writes the final `.typ` file.

pub mod chart_svg;
pub mod default_template;
pub mod tables;

use chrono::NaiveDateTime;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::CapsimError;
use crate::domain::series::IndicatorSeries;
use crate::domain::simulation::SimulationRun;
use crate::domain::statistics::SimulationSummary;
use crate::ports::export_port::LedgerExportPort;

use tables::IndicatorOverview;

/// Context for resolving template placeholders.
pub struct ReportContext<'a> {
    pub title: &'a str,
    pub run: &'a SimulationRun,
    pub summary: &'a SimulationSummary,
    pub indicators: &'a [IndicatorOverview],
    pub generated_at: NaiveDateTime,
}

fn embed_svg(svg: &str, empty_note: &str) -> String {
    if svg.is_empty() {
        return format!("_{empty_note}_");
    }
    format!(
        "#image(bytes(\"{}\"), format: \"svg\", width: 100%)",
        svg.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
    )
}

/// Resolve all `{{PLACEHOLDER}}`s in the given template string and return
/// the final Typst markup ready to be written to a `.typ` file.
pub fn resolve(template: &str, ctx: &ReportContext) -> String {
    let mut output = template.to_string();
    let ledger = &ctx.run.ledger;

    output = output.replace("{{TITLE}}", &ctx.title.replace('"', "'"));
    output = output.replace(
        "{{GENERATED_AT}}",
        &ctx.generated_at.format("%Y-%m-%d %H:%M").to_string(),
    );
    output = output.replace("{{PARAMETERS_TABLE}}", &tables::render_parameters_table(ctx.run));
    output = output.replace("{{SUMMARY_TABLE}}", &tables::render_summary_table(ctx.summary));
    output = output.replace(
        "{{INDICATORS_TABLE}}",
        &tables::render_indicators_table(&ctx.run.indicator_names, ctx.indicators),
    );

    let balance = embed_svg(&chart_svg::generate_balance_svg(ledger), "No balance data.");
    output = output.replace("{{BALANCE_CHART_SVG}}", &balance);

    let drawdown = embed_svg(&chart_svg::generate_drawdown_svg(ledger), "No drawdown data.");
    output = output.replace("{{DRAWDOWN_CHART_SVG}}", &drawdown);

    let monthly = tables::render_monthly_returns(ledger);
    let monthly = if monthly.is_empty() {
        "_Insufficient data for monthly returns._".to_string()
    } else {
        monthly
    };
    output = output.replace("{{MONTHLY_RETURNS}}", &monthly);

    output = output.replace("{{LEDGER_TABLE}}", &tables::render_ledger_table(ledger));

    output
}

/// Writes a `.typ` report. Uses the built-in template unless a custom
/// template path is set.
#[derive(Default)]
pub struct TypstReportExporter {
    template_path: Option<PathBuf>,
    title: Option<String>,
    indicators: Vec<IndicatorOverview>,
}

impl TypstReportExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_indicators(mut self, indicators: &BTreeMap<String, IndicatorSeries>) -> Self {
        self.indicators = IndicatorOverview::from_map(indicators);
        self
    }

    fn load_template(&self) -> Result<String, CapsimError> {
        match &self.template_path {
            None => Ok(default_template::template().to_string()),
            Some(path) => fs::read_to_string(path).map_err(|e| CapsimError::Export {
                path: path.display().to_string(),
                reason: format!("failed to read template: {e}"),
            }),
        }
    }
}

impl LedgerExportPort for TypstReportExporter {
    fn export(
        &self,
        run: &SimulationRun,
        summary: &SimulationSummary,
        output_path: &Path,
    ) -> Result<(), CapsimError> {
        let template = self.load_template()?;
        let ctx = ReportContext {
            title: self.title.as_deref().unwrap_or("Portfolio Simulation Report"),
            run,
            summary,
            indicators: &self.indicators,
            generated_at: chrono::Local::now().naive_local(),
        };

        let markup = resolve(&template, &ctx);
        fs::write(output_path, markup).map_err(|e| CapsimError::Export {
            path: output_path.display().to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(path = %output_path.display(), "typst report written");
        Ok(())
    }
}
