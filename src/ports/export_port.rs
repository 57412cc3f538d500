//! Ledger export port trait.

use std::path::Path;

use crate::domain::error::CapsimError;
use crate::domain::simulation::SimulationRun;
use crate::domain::statistics::SimulationSummary;

/// Port for writing a finished run somewhere outside the process.
pub trait LedgerExportPort {
    fn export(
        &self,
        run: &SimulationRun,
        summary: &SimulationSummary,
        output_path: &Path,
    ) -> Result<(), CapsimError>;
}
