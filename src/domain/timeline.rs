//! Monthly timeline construction.
//!
//! The engine steps through calendar month-ends. The start of the timeline
//! is either the caller's `start_date` or the earliest sample across all
//! indicators, falling back to a fixed lookback before `end_date` when no
//! indicator has data.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::domain::series::IndicatorSeries;

/// Lookback used when no indicator carries any sample.
pub const DEFAULT_LOOKBACK_DAYS: i64 = 5 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    Explicit,
    #[default]
    EarliestIndicator,
}

impl fmt::Display for StartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartPolicy::Explicit => write!(f, "explicit"),
            StartPolicy::EarliestIndicator => write!(f, "earliest_indicator"),
        }
    }
}

impl FromStr for StartPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "explicit" => Ok(StartPolicy::Explicit),
            "earliest_indicator" | "earliest" => Ok(StartPolicy::EarliestIndicator),
            other => Err(format!(
                "unknown start policy '{other}' (expected explicit or earliest_indicator)"
            )),
        }
    }
}

/// Last calendar day of the month containing `date`.
pub fn month_end(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).and_then(|first| first.pred_opt())
}

pub fn resolve_start(
    policy: StartPolicy,
    start_date: NaiveDate,
    end_date: NaiveDate,
    indicators: &BTreeMap<String, IndicatorSeries>,
) -> NaiveDate {
    match policy {
        StartPolicy::Explicit => start_date,
        StartPolicy::EarliestIndicator => indicators
            .values()
            .filter_map(IndicatorSeries::first_date)
            .min()
            .unwrap_or_else(|| end_date - Duration::days(DEFAULT_LOOKBACK_DAYS)),
    }
}

/// Month-ends `>= start` and `<= end`, in order.
pub fn month_ends(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut cursor = month_end(start);

    while let Some(date) = cursor {
        if date > end {
            break;
        }
        dates.push(date);
        cursor = date.succ_opt().and_then(month_end);
    }

    dates
}
