//! SVG chart rendering for reports.
//!
//! Charts are plain SVG strings; the report wraps them in `image.decode`.

use crate::domain::simulation::LedgerRow;

const CHART_WIDTH: f64 = 640.0;
const CHART_HEIGHT: f64 = 240.0;
const MARGIN: f64 = 40.0;

struct Series<'a> {
    values: &'a [f64],
    min: f64,
    max: f64,
}

impl<'a> Series<'a> {
    fn new(values: &'a [f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self { values, min, max })
    }

    fn points(&self) -> String {
        let plot_width = CHART_WIDTH - 2.0 * MARGIN;
        let plot_height = CHART_HEIGHT - 2.0 * MARGIN;

        let range = self.max - self.min;
        let scale_y = if range > 0.0 { plot_height / range } else { 0.0 };
        let scale_x = if self.values.len() > 1 {
            plot_width / (self.values.len() - 1) as f64
        } else {
            0.0
        };
        // Flat series are drawn through the middle of the plot.
        let offset_y = if range > 0.0 { 0.0 } else { plot_height / 2.0 };

        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let x = MARGIN + i as f64 * scale_x;
                let y = CHART_HEIGHT - MARGIN - offset_y - (v - self.min) * scale_y;
                format!("{x:.1},{y:.1}")
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn render(series: &Series<'_>, stroke: &str, fill: Option<&str>, first: &str, last: &str) -> String {
    let points = series.points();
    let baseline = CHART_HEIGHT - MARGIN;
    let right = CHART_WIDTH - MARGIN;

    let area = match fill {
        Some(color) => format!(
            r#"<polygon points="{MARGIN:.1},{baseline:.1} {points} {right:.1},{baseline:.1}" fill="{color}" stroke="none"/>"#
        ),
        None => String::new(),
    };

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="{w}" height="{h}" fill="white"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{baseline}" stroke="#888" stroke-width="1"/>
<line x1="{m}" y1="{baseline}" x2="{right}" y2="{baseline}" stroke="#888" stroke-width="1"/>
{area}
<polyline points="{points}" fill="none" stroke="{stroke}" stroke-width="1.5"/>
<text x="{m}" y="{m_text}" font-size="10" fill="#444">max {max:.2}</text>
<text x="{m}" y="{bottom_text}" font-size="10" fill="#444">min {min:.2}</text>
<text x="{m}" y="{date_text}" font-size="10" fill="#444">{first}</text>
<text x="{right}" y="{date_text}" font-size="10" fill="#444" text-anchor="end">{last}</text>
</svg>"##,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        m = MARGIN,
        m_text = MARGIN - 6.0,
        bottom_text = baseline - 4.0,
        date_text = baseline + 16.0,
        max = series.max,
        min = series.min,
    )
}

fn date_bounds(ledger: &[LedgerRow]) -> (String, String) {
    let first = ledger.first().map(|r| r.date.to_string()).unwrap_or_default();
    let last = ledger.last().map(|r| r.date.to_string()).unwrap_or_default();
    (first, last)
}

/// Ending balance per month. Empty string when there is nothing to draw.
pub fn generate_balance_svg(ledger: &[LedgerRow]) -> String {
    let balances: Vec<f64> = ledger.iter().map(|r| r.ending_balance).collect();
    let Some(series) = Series::new(&balances) else {
        return String::new();
    };
    let (first, last) = date_bounds(ledger);
    render(&series, "#1f4e9c", None, &first, &last)
}

/// Drawdown from running peak, in percent (values are `<= 0`).
pub fn generate_drawdown_svg(ledger: &[LedgerRow]) -> String {
    let drawdowns = drawdown_series(ledger);
    let Some(series) = Series::new(&drawdowns) else {
        return String::new();
    };
    let (first, last) = date_bounds(ledger);
    render(&series, "#b22222", Some("#f6caca"), &first, &last)
}

pub fn drawdown_series(ledger: &[LedgerRow]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    ledger
        .iter()
        .map(|row| {
            peak = peak.max(row.ending_balance);
            if peak > 0.0 {
                (row.ending_balance / peak - 1.0) * 100.0
            } else {
                0.0
            }
        })
        .collect()
}
