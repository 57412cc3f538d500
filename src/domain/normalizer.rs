//! Indicator normalizer.
//!
//! Converts a raw tabular payload (a rate table, a closing-price table or a
//! fund-quota table) into an [`IndicatorSeries`] aligned to calendar months.
//!
//! - Rate tables: samples inside one calendar month are averaged into a
//!   single sample dated on the first of that month.
//! - Price tables: the last close of each month is kept, then consecutive
//!   month closes become percentage returns. The first month has no prior
//!   close and yields nothing.
//!
//! Rows that fail to parse are dropped with a [`DataGapWarning`]; only a
//! missing column is an error.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::domain::error::{CapsimError, DataGapWarning};
use crate::domain::series::{IndicatorKind, IndicatorSeries, Sample};

/// One cell of a raw payload, as delivered by an ingest adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
    Empty,
}

impl From<&str> for RawCell {
    fn from(s: &str) -> Self {
        if s.trim().is_empty() {
            RawCell::Empty
        } else {
            RawCell::Text(s.to_string())
        }
    }
}

impl From<f64> for RawCell {
    fn from(v: f64) -> Self {
        RawCell::Number(v)
    }
}

impl From<NaiveDate> for RawCell {
    fn from(d: NaiveDate) -> Self {
        RawCell::Date(d)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<RawCell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawCell>>) -> Self {
        Self { headers, rows }
    }

    /// Case-insensitive header lookup.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }
}

/// How to read one indicator out of its raw table.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSpec {
    pub name: String,
    pub source_id: String,
    pub kind: IndicatorKind,
    pub date_column: String,
    pub value_column: String,
}

impl IndicatorSpec {
    pub fn rate(name: &str, source_id: &str) -> Self {
        Self {
            name: name.to_string(),
            source_id: source_id.to_string(),
            kind: IndicatorKind::Rate,
            date_column: "date".to_string(),
            value_column: "value".to_string(),
        }
    }

    pub fn price(name: &str, source_id: &str) -> Self {
        Self {
            kind: IndicatorKind::Price,
            value_column: "close".to_string(),
            ..Self::rate(name, source_id)
        }
    }
}

/// Normalize a raw table, logging any dropped rows.
pub fn normalize(table: &RawTable, spec: &IndicatorSpec) -> Result<IndicatorSeries, CapsimError> {
    let (series, warnings) = normalize_with_warnings(table, spec)?;
    for warning in &warnings {
        tracing::warn!(indicator = %spec.name, "{warning}");
    }
    Ok(series)
}

/// Normalize a raw table and hand the data-gap warnings back to the caller.
pub fn normalize_with_warnings(
    table: &RawTable,
    spec: &IndicatorSpec,
) -> Result<(IndicatorSeries, Vec<DataGapWarning>), CapsimError> {
    let date_idx = table
        .column_index(&spec.date_column)
        .ok_or_else(|| CapsimError::MissingColumn {
            source_id: spec.source_id.clone(),
            column: spec.date_column.clone(),
        })?;
    let value_idx = table
        .column_index(&spec.value_column)
        .ok_or_else(|| CapsimError::MissingColumn {
            source_id: spec.source_id.clone(),
            column: spec.value_column.clone(),
        })?;

    let mut warnings = Vec::new();
    let mut parsed: Vec<Sample> = Vec::with_capacity(table.rows.len());

    for (row_no, row) in table.rows.iter().enumerate() {
        let date = row
            .get(date_idx)
            .ok_or_else(|| "row too short for date column".to_string())
            .and_then(parse_date_cell);
        let value = row
            .get(value_idx)
            .ok_or_else(|| "row too short for value column".to_string())
            .and_then(parse_value_cell);

        match (date, value) {
            (Ok(date), Ok(value)) => parsed.push(Sample { date, value }),
            (Err(reason), _) | (_, Err(reason)) => {
                warnings.push(DataGapWarning::UnparsableRow {
                    source_id: spec.source_id.clone(),
                    row: row_no + 1,
                    reason,
                });
            }
        }
    }

    parsed.sort_by_key(|s| s.date);

    let samples = match spec.kind {
        IndicatorKind::Rate => aggregate_monthly_mean(&parsed),
        IndicatorKind::Price => monthly_price_returns(&parsed, &spec.source_id, &mut warnings),
    };

    Ok((
        IndicatorSeries::new(spec.source_id.clone(), spec.kind, samples),
        warnings,
    ))
}

fn aggregate_monthly_mean(samples: &[Sample]) -> Vec<Sample> {
    let mut months: BTreeMap<(i32, u32), (f64, usize)> = BTreeMap::new();
    for s in samples {
        let entry = months.entry((s.date.year(), s.date.month())).or_insert((0.0, 0));
        entry.0 += s.value;
        entry.1 += 1;
    }

    months
        .into_iter()
        .filter_map(|((year, month), (sum, count))| {
            NaiveDate::from_ymd_opt(year, month, 1).map(|date| Sample {
                date,
                value: sum / count as f64,
            })
        })
        .collect()
}

fn monthly_price_returns(
    samples: &[Sample],
    source_id: &str,
    warnings: &mut Vec<DataGapWarning>,
) -> Vec<Sample> {
    // Input is sorted, so the last insert per month is the month close.
    let mut closes: BTreeMap<(i32, u32), Sample> = BTreeMap::new();
    for s in samples {
        closes.insert((s.date.year(), s.date.month()), *s);
    }

    let closes: Vec<Sample> = closes.into_values().collect();
    let mut returns = Vec::with_capacity(closes.len().saturating_sub(1));

    for pair in closes.windows(2) {
        let (prev, curr) = (pair[0], pair[1]);
        if prev.value <= 0.0 {
            warnings.push(DataGapWarning::NonPositivePrice {
                source_id: source_id.to_string(),
                date: curr.date,
            });
            continue;
        }
        returns.push(Sample {
            date: curr.date,
            value: (curr.value / prev.value - 1.0) * 100.0,
        });
    }

    returns
}

/// Parse a date cell. Offsets are dropped, keeping the local calendar date.
pub fn parse_date_cell(cell: &RawCell) -> Result<NaiveDate, String> {
    match cell {
        RawCell::Date(d) => Ok(*d),
        RawCell::DateTime(dt) => Ok(dt.naive_local().date()),
        RawCell::Text(s) => parse_date_text(s),
        RawCell::Number(n) => Err(format!("expected a date, got number {n}")),
        RawCell::Empty => Err("empty date".to_string()),
    }
}

fn parse_date_text(raw: &str) -> Result<NaiveDate, String> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_local().date());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(dt.naive_local().date());
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%d/%m/%Y") {
        return Ok(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    // Month periods such as "2024-07" are anchored on the first day.
    if let Ok(d) = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d") {
        return Ok(d);
    }

    Err(format!("invalid date '{s}'"))
}

/// Parse a value cell, accepting a decimal comma.
pub fn parse_value_cell(cell: &RawCell) -> Result<f64, String> {
    let value = match cell {
        RawCell::Number(n) => *n,
        RawCell::Text(s) => {
            let cleaned = s.trim().replace(',', ".");
            cleaned
                .parse::<f64>()
                .map_err(|_| format!("invalid value '{}'", s.trim()))?
        }
        RawCell::Empty => return Err("empty value".to_string()),
        RawCell::Date(_) | RawCell::DateTime(_) => {
            return Err("expected a number, got a date".to_string());
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("non-finite value {value}"))
    }
}
