//! Return blender.
//!
//! Resolves each indicator's last known value at or before a target month
//! and combines them into one equally-weighted percentage return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::series::IndicatorSeries;

/// Denominator used when some indicators have no value for a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendPolicy {
    /// Divide by every configured indicator; missing ones pull the blend
    /// toward zero.
    #[default]
    ConfiguredCount,
    /// Divide only by the indicators that resolved a value.
    ResolvedOnly,
}

impl fmt::Display for BlendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendPolicy::ConfiguredCount => write!(f, "configured"),
            BlendPolicy::ResolvedOnly => write!(f, "resolved"),
        }
    }
}

impl FromStr for BlendPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "configured" | "configured_count" => Ok(BlendPolicy::ConfiguredCount),
            "resolved" | "resolved_only" => Ok(BlendPolicy::ResolvedOnly),
            other => Err(format!(
                "unknown blend denominator '{other}' (expected configured or resolved)"
            )),
        }
    }
}

/// Why an indicator did not contribute to a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapReason {
    EmptySeries,
    BeforeFirstSample,
    NonFiniteValue,
}

impl fmt::Display for GapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapReason::EmptySeries => write!(f, "series has no samples"),
            GapReason::BeforeFirstSample => write!(f, "date precedes first sample"),
            GapReason::NonFiniteValue => write!(f, "sample value is not a finite number"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Resolved { date: NaiveDate, value: f64 },
    Unresolved(GapReason),
}

impl Resolution {
    pub fn value(&self) -> Option<f64> {
        match self {
            Resolution::Resolved { value, .. } => Some(*value),
            Resolution::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contribution {
    pub name: String,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlendOutcome {
    pub return_pct: f64,
    pub resolved: usize,
    pub configured: usize,
    pub contributions: Vec<Contribution>,
}

pub fn resolve(series: &IndicatorSeries, target: NaiveDate) -> Resolution {
    if series.is_empty() {
        return Resolution::Unresolved(GapReason::EmptySeries);
    }
    match series.value_at_or_before(target) {
        None => Resolution::Unresolved(GapReason::BeforeFirstSample),
        Some(sample) if !sample.value.is_finite() => {
            Resolution::Unresolved(GapReason::NonFiniteValue)
        }
        Some(sample) => Resolution::Resolved {
            date: sample.date,
            value: sample.value,
        },
    }
}

pub fn blend(
    target: NaiveDate,
    indicators: &BTreeMap<String, IndicatorSeries>,
    policy: BlendPolicy,
) -> BlendOutcome {
    let configured = indicators.len();
    let mut contributions = Vec::with_capacity(configured);
    let mut sum = 0.0;
    let mut resolved = 0usize;

    for (name, series) in indicators {
        let resolution = resolve(series, target);
        match resolution {
            Resolution::Resolved { value, .. } => {
                sum += value;
                resolved += 1;
            }
            Resolution::Unresolved(reason) => {
                tracing::debug!(indicator = %name, month = %target, %reason, "indicator unresolved");
            }
        }
        contributions.push(Contribution {
            name: name.clone(),
            resolution,
        });
    }

    let denominator = match policy {
        BlendPolicy::ConfiguredCount => configured,
        BlendPolicy::ResolvedOnly => resolved,
    };

    let return_pct = if denominator == 0 {
        0.0
    } else {
        sum / denominator as f64
    };

    BlendOutcome {
        return_pct,
        resolved,
        configured,
        contributions,
    }
}

/// Blended percentage for `target`, without the per-indicator detail.
pub fn blend_return(
    target: NaiveDate,
    indicators: &BTreeMap<String, IndicatorSeries>,
    policy: BlendPolicy,
) -> f64 {
    blend(target, indicators, policy).return_pct
}
