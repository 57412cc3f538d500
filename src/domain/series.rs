//! Normalized indicator time series.
//!
//! Every external indicator, whatever its origin, ends up as an
//! [`IndicatorSeries`]: a chronological list of `(date, value)` samples on
//! timezone-naive calendar dates. Values are percentages per period (a rate
//! as published, or a return derived from prices).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shape of the raw source an indicator was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndicatorKind {
    /// Already a periodic rate in percent (CDI, Selic, IPCA).
    Rate,
    /// A price or quota level; returns are derived from consecutive closes.
    Price,
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Rate => write!(f, "rate"),
            IndicatorKind::Price => write!(f, "price"),
        }
    }
}

impl FromStr for IndicatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rate" => Ok(IndicatorKind::Rate),
            "price" | "quota" => Ok(IndicatorKind::Price),
            other => Err(format!("unknown indicator kind '{other}' (expected rate or price)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub source_id: String,
    pub kind: IndicatorKind,
    pub samples: Vec<Sample>,
}

impl IndicatorSeries {
    /// Builds a series, sorting samples by date (stable for equal dates).
    pub fn new(source_id: impl Into<String>, kind: IndicatorKind, mut samples: Vec<Sample>) -> Self {
        samples.sort_by_key(|s| s.date);
        Self {
            source_id: source_id.into(),
            kind,
            samples,
        }
    }

    pub fn empty(source_id: impl Into<String>, kind: IndicatorKind) -> Self {
        Self::new(source_id, kind, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.samples.first().map(|s| s.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.samples.last().map(|s| s.date)
    }

    /// Latest sample with `date <= target`, never a later one.
    pub fn value_at_or_before(&self, target: NaiveDate) -> Option<&Sample> {
        let idx = self.samples.partition_point(|s| s.date <= target);
        if idx == 0 {
            None
        } else {
            self.samples.get(idx - 1)
        }
    }

    /// Arithmetic mean of the finite sample values.
    pub fn mean_value(&self) -> Option<f64> {
        let finite: Vec<f64> = self
            .samples
            .iter()
            .map(|s| s.value)
            .filter(|v| v.is_finite())
            .collect();
        if finite.is_empty() {
            None
        } else {
            Some(finite.iter().sum::<f64>() / finite.len() as f64)
        }
    }
}
