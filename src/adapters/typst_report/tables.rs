//! Table formatting for reports.
//!
//! Provides functions to generate Typst markup for:
//! - Simulation parameters and summary statistics
//! - Indicator overview (source, coverage, mean)
//! - Monthly returns heatmap grid
//! - The full ledger

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::domain::series::{IndicatorKind, IndicatorSeries};
use crate::domain::simulation::{LedgerRow, SimulationRun};
use crate::domain::statistics::SimulationSummary;

/// Coverage of one indicator, detached from its samples.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorOverview {
    pub name: String,
    pub source_id: String,
    pub kind: IndicatorKind,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub samples: usize,
    pub mean_value: Option<f64>,
}

impl IndicatorOverview {
    pub fn from_series(name: &str, series: &IndicatorSeries) -> Self {
        Self {
            name: name.to_string(),
            source_id: series.source_id.clone(),
            kind: series.kind,
            first_date: series.first_date(),
            last_date: series.last_date(),
            samples: series.len(),
            mean_value: series.mean_value(),
        }
    }

    pub fn from_map(indicators: &BTreeMap<String, IndicatorSeries>) -> Vec<Self> {
        indicators
            .iter()
            .map(|(name, series)| Self::from_series(name, series))
            .collect()
    }
}

/// Thousands-separated currency amount with two decimals.
pub fn fmt_currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u128;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{:02}", if negative { "-" } else { "" }, grouped, frac)
}

fn fmt_pct(value: f64) -> String {
    format!("{value:.2}%")
}

/// Escapes characters that Typst treats as markup inside content blocks.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '#' | '[' | ']' | '*' | '_' | '$' | '@' | '<' | '>' | '\\' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn render_parameters_table(run: &SimulationRun) -> String {
    let p = &run.parameters;
    let period = match (run.first_date(), run.last_date()) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => format!("{} to {}", p.start_date, p.end_date),
    };

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: (auto, 1fr),\n");
    output.push_str("  align: (left, right),\n");
    output.push_str("  [*Parameter*], [*Value*],\n");
    output.push_str(&format!("  [Initial capital], [{}],\n", fmt_currency(p.initial_capital)));
    output.push_str(&format!(
        "  [Monthly contribution], [{}],\n",
        fmt_currency(p.monthly_contribution)
    ));
    output.push_str(&format!(
        "  [Monthly withdrawal], [{}],\n",
        fmt_currency(p.monthly_withdrawal)
    ));
    output.push_str(&format!(
        "  [Reinvest withdrawals], [{}],\n",
        if p.reinvest_withdrawals { "yes" } else { "no" }
    ));
    output.push_str(&format!("  [Start policy], [{}],\n", p.start_policy));
    output.push_str(&format!("  [Blend denominator], [{}],\n", run.blend_policy));
    output.push_str(&format!("  [Simulated period], [{period}],\n"));
    output.push_str(")\n\n");
    output
}

pub fn render_summary_table(summary: &SimulationSummary) -> String {
    let rows = [
        ("Final balance", fmt_currency(summary.final_balance)),
        ("Total return", fmt_pct(summary.total_return_pct)),
        ("Annualized return", fmt_pct(summary.annualized_return_pct)),
        ("Average monthly return", fmt_pct(summary.average_monthly_return_pct)),
        ("Volatility", fmt_pct(summary.volatility_pct)),
        ("Sharpe-like ratio", format!("{:.2}", summary.sharpe_like_ratio)),
        ("Max drawdown", fmt_pct(summary.max_drawdown_pct)),
        ("Total contributed", fmt_currency(summary.total_contributed)),
        ("Total withdrawn", fmt_currency(summary.total_withdrawn)),
        ("Months", summary.months.to_string()),
    ];

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: (auto, 1fr),\n");
    output.push_str("  align: (left, right),\n");
    output.push_str("  [*Metric*], [*Value*],\n");
    for (label, value) in rows {
        output.push_str(&format!("  [{label}], [{value}],\n"));
    }
    output.push_str(")\n\n");
    output
}

/// Falls back to a names-only table when no coverage data is available.
pub fn render_indicators_table(names: &[String], overview: &[IndicatorOverview]) -> String {
    if names.is_empty() && overview.is_empty() {
        return "_No indicators configured; every period returns 0%._\n\n".to_string();
    }

    let mut output = String::new();
    output.push_str("#table(\n");

    if overview.is_empty() {
        output.push_str("  columns: 1,\n");
        output.push_str("  [*Indicator*],\n");
        for name in names {
            output.push_str(&format!("  [{}],\n", escape(name)));
        }
    } else {
        output.push_str("  columns: 7,\n");
        output.push_str("  align: (left, left, left, left, left, right, right),\n");
        output.push_str("  [*Indicator*], [*Source*], [*Kind*], [*First*], [*Last*], ");
        output.push_str("[*Samples*], [*Mean (%)*],\n");
        for ind in overview {
            let date = |d: Option<NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
            let mean = ind
                .mean_value
                .map(|m| format!("{m:.4}"))
                .unwrap_or_else(|| "-".into());
            output.push_str(&format!(
                "  [{}], [{}], [{}], [{}], [{}], [{}], [{}],\n",
                escape(&ind.name),
                escape(&ind.source_id),
                ind.kind,
                date(ind.first_date),
                date(ind.last_date),
                ind.samples,
                mean
            ));
        }
    }

    output.push_str(")\n\n");
    output
}

/// Returns (fill_color, needs_white_text) for a monthly return in percent.
fn return_color(ret: f64) -> (&'static str, bool) {
    if ret >= 5.0 {
        ("rgb(\"#006400\")", true)
    } else if ret >= 2.0 {
        ("rgb(\"#228B22\")", true)
    } else if ret >= 0.5 {
        ("rgb(\"#90EE90\")", false)
    } else if ret > 0.0 {
        ("rgb(\"#E0FFE0\")", false)
    } else if ret == 0.0 {
        ("rgb(\"#FFFFFF\")", false)
    } else if ret > -0.5 {
        ("rgb(\"#FFE0E0\")", false)
    } else if ret > -2.0 {
        ("rgb(\"#FF9090\")", false)
    } else if ret > -5.0 {
        ("rgb(\"#FF4444\")", true)
    } else {
        ("rgb(\"#8B0000\")", true)
    }
}

fn format_heatmap_cell(ret: f64) -> String {
    let (color, white_text) = return_color(ret);
    let formatted = format!("{ret:+.2}%");
    if white_text {
        format!("table.cell(fill: {color})[#text(fill: white)[{formatted}]]")
    } else {
        format!("table.cell(fill: {color})[{formatted}]")
    }
}

/// Year by month grid of `period_return_pct`, with a compounded YTD column.
/// The opening row carries no return and is left out.
pub fn render_monthly_returns(ledger: &[LedgerRow]) -> String {
    if ledger.len() < 2 {
        return String::new();
    }

    let mut years: BTreeMap<i32, [Option<f64>; 12]> = BTreeMap::new();
    for row in &ledger[1..] {
        let entry = years.entry(row.date.year()).or_insert([None; 12]);
        entry[row.date.month0() as usize] = Some(row.period_return_pct);
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 14,\n");
    output.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    output.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*YTD*],\n");

    for (year, monthly) in &years {
        output.push_str(&format!("  [{year}],"));

        let mut ytd = 1.0_f64;
        for ret in monthly {
            match ret {
                Some(ret) => {
                    ytd *= 1.0 + ret / 100.0;
                    output.push_str(&format!(" {},", format_heatmap_cell(*ret)));
                }
                None => output.push_str(" [-],"),
            }
        }
        output.push_str(&format!(" {},\n", format_heatmap_cell((ytd - 1.0) * 100.0)));
    }

    output.push_str(")\n\n");
    output
}

pub fn render_ledger_table(ledger: &[LedgerRow]) -> String {
    if ledger.is_empty() {
        return "_Empty ledger._\n\n".to_string();
    }

    let mut output = String::new();
    output.push_str("#table(\n");
    output.push_str("  columns: 7,\n");
    output.push_str("  align: (left, right, right, right, right, right, right),\n");
    output.push_str("  [*Date*], [*Start*], [*Contribution*], [*Withdrawal*], ");
    output.push_str("[*Return*], [*End*], [*Resolved*],\n");

    for row in ledger {
        let color = if row.period_return_pct >= 0.0 { "green" } else { "red" };
        output.push_str(&format!(
            "  [{}], [{}], [{}], [{}], text(fill: {}, [{:+.4}%]), [{}], [{}],\n",
            row.date.format("%Y-%m-%d"),
            fmt_currency(row.period_start_balance),
            fmt_currency(row.contribution),
            fmt_currency(row.withdrawal),
            color,
            row.period_return_pct,
            fmt_currency(row.ending_balance),
            row.indicators_resolved
        ));
    }

    output.push_str(")\n\n");
    output
}
