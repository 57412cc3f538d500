//! Machine-readable ledger exporters: CSV and JSON.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::error::CapsimError;
use crate::domain::simulation::{LedgerRow, SimulationParameters, SimulationRun};
use crate::domain::statistics::SimulationSummary;
use crate::ports::export_port::LedgerExportPort;

fn export_error(path: &Path, reason: impl std::fmt::Display) -> CapsimError {
    CapsimError::Export {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

/// One CSV record per ledger row, dates as `YYYY-MM-DD`, plain numbers.
pub struct CsvLedgerExporter {
    delimiter: u8,
}

impl CsvLedgerExporter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Default for CsvLedgerExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerExportPort for CsvLedgerExporter {
    fn export(
        &self,
        run: &SimulationRun,
        _summary: &SimulationSummary,
        output_path: &Path,
    ) -> Result<(), CapsimError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(output_path)
            .map_err(|e| export_error(output_path, e))?;

        for row in &run.ledger {
            writer
                .serialize(row)
                .map_err(|e| export_error(output_path, e))?;
        }
        writer.flush().map_err(|e| export_error(output_path, e))?;

        tracing::info!(path = %output_path.display(), rows = run.ledger.len(), "ledger written as csv");
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    parameters: &'a SimulationParameters,
    indicators: &'a [String],
    blend_policy: String,
    summary: &'a SimulationSummary,
    ledger: &'a [LedgerRow],
}

/// Pretty-printed JSON with parameters, summary and the full ledger.
#[derive(Default)]
pub struct JsonLedgerExporter;

impl LedgerExportPort for JsonLedgerExporter {
    fn export(
        &self,
        run: &SimulationRun,
        summary: &SimulationSummary,
        output_path: &Path,
    ) -> Result<(), CapsimError> {
        let doc = JsonDocument {
            parameters: &run.parameters,
            indicators: &run.indicator_names,
            blend_policy: run.blend_policy.to_string(),
            summary,
            ledger: &run.ledger,
        };

        let file = File::create(output_path).map_err(|e| export_error(output_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &doc)
            .map_err(|e| export_error(output_path, e))?;
        writer.flush().map_err(|e| export_error(output_path, e))?;

        tracing::info!(path = %output_path.display(), "run written as json");
        Ok(())
    }
}
