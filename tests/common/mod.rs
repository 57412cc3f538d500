#![allow(dead_code)]

use capsim::domain::error::CapsimError;
use capsim::domain::normalizer::{IndicatorSpec, RawCell, RawTable};
use capsim::domain::series::{IndicatorKind, IndicatorSeries, Sample};
use capsim::ports::indicator_port::IndicatorSource;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;

pub struct MockIndicatorSource {
    pub tables: HashMap<String, RawTable>,
    pub errors: HashMap<String, String>,
}

impl MockIndicatorSource {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_table(mut self, source_id: &str, table: RawTable) -> Self {
        self.tables.insert(source_id.to_string(), table);
        self
    }

    pub fn with_error(mut self, source_id: &str, reason: &str) -> Self {
        self.errors.insert(source_id.to_string(), reason.to_string());
        self
    }
}

impl IndicatorSource for MockIndicatorSource {
    fn load(&self, spec: &IndicatorSpec) -> Result<RawTable, CapsimError> {
        if let Some(reason) = self.errors.get(&spec.source_id) {
            return Err(CapsimError::Database {
                reason: reason.clone(),
            });
        }
        self.tables
            .get(&spec.source_id)
            .cloned()
            .ok_or_else(|| CapsimError::Database {
                reason: format!("no table for {}", spec.source_id),
            })
    }

    fn list_sources(&self) -> Result<Vec<String>, CapsimError> {
        let mut ids: Vec<String> = self.tables.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A `date,value` table from `(date, value)` text pairs.
pub fn text_table(headers: [&str; 2], rows: &[(&str, &str)]) -> RawTable {
    RawTable::new(
        headers.iter().map(|h| h.to_string()).collect(),
        rows.iter()
            .map(|(d, v)| vec![RawCell::from(*d), RawCell::from(*v)])
            .collect(),
    )
}

/// Monthly rate table with one row per `(year, month)` at `value` percent.
pub fn rate_table(months: &[(i32, u32)], value: f64) -> RawTable {
    RawTable::new(
        vec!["date".into(), "value".into()],
        months
            .iter()
            .map(|&(y, m)| vec![RawCell::Date(date(y, m, 1)), RawCell::Number(value)])
            .collect(),
    )
}

pub fn rate_series(source_id: &str, points: &[(NaiveDate, f64)]) -> IndicatorSeries {
    IndicatorSeries::new(
        source_id,
        IndicatorKind::Rate,
        points
            .iter()
            .map(|&(date, value)| Sample { date, value })
            .collect(),
    )
}

pub fn single_indicator(name: &str, series: IndicatorSeries) -> BTreeMap<String, IndicatorSeries> {
    let mut map = BTreeMap::new();
    map.insert(name.to_string(), series);
    map
}

pub fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
