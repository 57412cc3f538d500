//! Indicator ingestion port trait.

use crate::domain::error::CapsimError;
use crate::domain::normalizer::{IndicatorSpec, RawTable};

/// Supplies raw tables for indicators. Implementations do no parsing beyond
/// splitting records into cells; the normalizer owns interpretation.
pub trait IndicatorSource {
    fn load(&self, spec: &IndicatorSpec) -> Result<RawTable, CapsimError>;

    /// Source ids this adapter can serve.
    fn list_sources(&self) -> Result<Vec<String>, CapsimError>;
}
