//! Domain error types.
//!
//! Two tiers: structural and parameter problems are returned as
//! [`CapsimError`]; data-quality problems never abort a run and are reported
//! as [`DataGapWarning`] values instead.

use chrono::NaiveDate;

/// An unexpected fault raised while the engine was stepping through a run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalculationFault {
    #[error("balance became non-finite ({balance}) on {date}")]
    NonFiniteBalance { date: NaiveDate, balance: f64 },
}

/// Top-level error type for capsim.
#[derive(Debug, thiserror::Error)]
pub enum CapsimError {
    #[error("invalid parameter {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("calculation failed ({context})")]
    Calculation {
        context: String,
        #[source]
        source: CalculationFault,
    },

    #[error("indicator {source_id} is missing required column '{column}'")]
    MissingColumn { source_id: String, column: String },

    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("export to {path} failed: {reason}")]
    Export { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CapsimError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        CapsimError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&CapsimError> for std::process::ExitCode {
    fn from(err: &CapsimError) -> Self {
        let code: u8 = match err {
            CapsimError::Io(_) => 1,
            CapsimError::ConfigParse { .. }
            | CapsimError::ConfigMissing { .. }
            | CapsimError::ConfigInvalid { .. } => 2,
            CapsimError::Database { .. } | CapsimError::DatabaseQuery { .. } => 3,
            CapsimError::Validation { .. } | CapsimError::MissingColumn { .. } => 4,
            CapsimError::Calculation { .. } => 5,
            CapsimError::Export { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

/// Non-fatal data-quality problem found while normalizing an indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum DataGapWarning {
    /// A row whose date or value could not be parsed; the row was dropped.
    UnparsableRow {
        source_id: String,
        row: usize,
        reason: String,
    },
    /// A price step whose previous price was zero or negative.
    NonPositivePrice { source_id: String, date: NaiveDate },
}

impl std::fmt::Display for DataGapWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataGapWarning::UnparsableRow {
                source_id,
                row,
                reason,
            } => write!(f, "{source_id}: dropped row {row} ({reason})"),
            DataGapWarning::NonPositivePrice { source_id, date } => {
                write!(f, "{source_id}: no return for {date} (previous price not positive)")
            }
        }
    }
}
