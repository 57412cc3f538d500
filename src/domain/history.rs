//! Persisted simulation runs and aggregates over them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::simulation::{SimulationParameters, SimulationRun};
use super::statistics::SimulationSummary;

/// A run ready to be stored; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRunRecord {
    pub parameters: SimulationParameters,
    pub indicators: Vec<String>,
    pub summary: SimulationSummary,
}

impl NewRunRecord {
    pub fn from_run(run: &SimulationRun, summary: &SimulationSummary) -> Self {
        Self {
            parameters: run.parameters.clone(),
            indicators: run.indicator_names.clone(),
            summary: summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: i64,
    pub created_at: NaiveDateTime,
    pub parameters: SimulationParameters,
    pub indicators: Vec<String>,
    pub summary: SimulationSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStatistics {
    pub count: usize,
    pub mean_total_return_pct: f64,
    pub mean_volatility_pct: f64,
    pub mean_sharpe_like_ratio: f64,
    pub mean_final_balance: f64,
    pub best_run_id: i64,
    pub worst_run_id: i64,
}

impl HistoryStatistics {
    pub fn compute(records: &[RunRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let n = records.len() as f64;
        let mean = |f: fn(&SimulationSummary) -> f64| {
            records.iter().map(|r| f(&r.summary)).sum::<f64>() / n
        };

        let by_return = |a: &&RunRecord, b: &&RunRecord| {
            a.summary
                .total_return_pct
                .total_cmp(&b.summary.total_return_pct)
        };
        let best = records.iter().max_by(by_return)?;
        let worst = records.iter().min_by(by_return)?;

        Some(Self {
            count: records.len(),
            mean_total_return_pct: mean(|s| s.total_return_pct),
            mean_volatility_pct: mean(|s| s.volatility_pct),
            mean_sharpe_like_ratio: mean(|s| s.sharpe_like_ratio),
            mean_final_balance: mean(|s| s.final_balance),
            best_run_id: best.id,
            worst_run_id: worst.id,
        })
    }
}

/// One metric for two runs, with `delta = a - b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDelta {
    pub a: f64,
    pub b: f64,
    pub delta: f64,
}

impl MetricDelta {
    fn new(a: f64, b: f64) -> Self {
        Self { a, b, delta: a - b }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunComparison {
    pub a_id: i64,
    pub b_id: i64,
    pub total_return_pct: MetricDelta,
    pub volatility_pct: MetricDelta,
    pub sharpe_like_ratio: MetricDelta,
    pub final_balance: MetricDelta,
}

impl RunComparison {
    pub fn between(a: &RunRecord, b: &RunRecord) -> Self {
        Self {
            a_id: a.id,
            b_id: b.id,
            total_return_pct: MetricDelta::new(
                a.summary.total_return_pct,
                b.summary.total_return_pct,
            ),
            volatility_pct: MetricDelta::new(a.summary.volatility_pct, b.summary.volatility_pct),
            sharpe_like_ratio: MetricDelta::new(
                a.summary.sharpe_like_ratio,
                b.summary.sharpe_like_ratio,
            ),
            final_balance: MetricDelta::new(a.summary.final_balance, b.summary.final_balance),
        }
    }

    /// `(label, metric)` pairs in display order.
    pub fn rows(&self) -> [(&'static str, MetricDelta); 4] {
        [
            ("Total return (%)", self.total_return_pct),
            ("Volatility (%)", self.volatility_pct),
            ("Sharpe-like ratio", self.sharpe_like_ratio),
            ("Final balance", self.final_balance),
        ]
    }
}
