//! CSV file indicator adapter.
//!
//! Each source id maps to `<base_path>/<source_id>.csv`. The first record is
//! the header row; every other record becomes a row of text cells.

use crate::domain::error::CapsimError;
use crate::domain::normalizer::{IndicatorSpec, RawCell, RawTable};
use crate::ports::indicator_port::IndicatorSource;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
    delimiter: u8,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            delimiter: b',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    fn csv_path(&self, source_id: &str) -> PathBuf {
        self.base_path.join(format!("{source_id}.csv"))
    }
}

/// Accepts a literal single character or one of `comma`, `semicolon`,
/// `tab`, `pipe`.
pub fn parse_delimiter(value: &str) -> Option<u8> {
    match value.trim().to_lowercase().as_str() {
        "" | "," | "comma" => Some(b','),
        ";" | "semicolon" => Some(b';'),
        "\\t" | "tab" => Some(b'\t'),
        "|" | "pipe" => Some(b'|'),
        other if other.len() == 1 => other.bytes().next(),
        _ => None,
    }
}

impl IndicatorSource for CsvAdapter {
    fn load(&self, spec: &IndicatorSpec) -> Result<RawTable, CapsimError> {
        let path = self.csv_path(&spec.source_id);
        let content = fs::read_to_string(&path).map_err(|e| CapsimError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        let content = content.trim_start_matches('\u{feff}');

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| CapsimError::Database {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| CapsimError::Database {
                reason: format!("CSV parse error in {}: {}", path.display(), e),
            })?;
            rows.push(record.iter().map(RawCell::from).collect());
        }

        tracing::debug!(
            source = %spec.source_id,
            path = %path.display(),
            rows = rows.len(),
            "loaded csv table"
        );

        Ok(RawTable::new(headers, rows))
    }

    fn list_sources(&self) -> Result<Vec<String>, CapsimError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| CapsimError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut sources = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| CapsimError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            if let Some(source_id) = name_str.strip_suffix(".csv") {
                sources.push(source_id.to_string());
            }
        }

        sources.sort();
        Ok(sources)
    }
}
