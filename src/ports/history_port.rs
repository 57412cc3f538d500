//! Run history port trait.

use crate::domain::error::CapsimError;
use crate::domain::history::{NewRunRecord, RunRecord};

pub trait RunHistoryPort {
    /// Stores a run and returns its assigned id.
    fn append(&self, record: &NewRunRecord) -> Result<i64, CapsimError>;

    /// Most recent runs first.
    fn list(&self, limit: Option<usize>) -> Result<Vec<RunRecord>, CapsimError>;

    fn get(&self, id: i64) -> Result<Option<RunRecord>, CapsimError>;
}
