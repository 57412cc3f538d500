//! Descriptive statistics over a simulation ledger.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::simulation::LedgerRow;

const MONTHS_PER_YEAR: f64 = 12.0;
const VOLATILITY_FLOOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityScale {
    Monthly,
    #[default]
    Annualized,
}

impl fmt::Display for VolatilityScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolatilityScale::Monthly => write!(f, "monthly"),
            VolatilityScale::Annualized => write!(f, "annualized"),
        }
    }
}

impl FromStr for VolatilityScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(VolatilityScale::Monthly),
            "annualized" | "annual" => Ok(VolatilityScale::Annualized),
            other => Err(format!(
                "unknown volatility scale '{other}' (expected monthly or annualized)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StdevKind {
    #[default]
    Population,
    Sample,
}

impl fmt::Display for StdevKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StdevKind::Population => write!(f, "population"),
            StdevKind::Sample => write!(f, "sample"),
        }
    }
}

impl FromStr for StdevKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "population" => Ok(StdevKind::Population),
            "sample" => Ok(StdevKind::Sample),
            other => Err(format!(
                "unknown stdev kind '{other}' (expected population or sample)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatisticsConfig {
    /// Annual risk-free rate, in percent.
    pub risk_free_rate_pct: f64,
    pub volatility_scale: VolatilityScale,
    pub stdev_kind: StdevKind,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub final_balance: f64,
    pub total_return_pct: f64,
    pub annualized_return_pct: f64,
    pub average_monthly_return_pct: f64,
    pub volatility_pct: f64,
    pub sharpe_like_ratio: f64,
    pub max_drawdown_pct: f64,
    pub total_contributed: f64,
    pub total_withdrawn: f64,
    pub months: usize,
}

impl SimulationSummary {
    pub fn compute(ledger: &[LedgerRow], config: &StatisticsConfig) -> Self {
        let (Some(first), Some(last)) = (ledger.first(), ledger.last()) else {
            return Self::default();
        };

        let initial = first.period_start_balance;
        let final_balance = last.ending_balance;
        let months = ledger.len() - 1;

        let total_return_pct = if initial > 0.0 {
            (final_balance / initial - 1.0) * 100.0
        } else {
            0.0
        };

        let annualized_return_pct = annualize(total_return_pct, months);

        let stepped = &ledger[1..];
        let average_monthly_return_pct = if stepped.is_empty() {
            0.0
        } else {
            stepped.iter().map(|r| r.period_return_pct).sum::<f64>() / stepped.len() as f64
        };

        let returns: Vec<f64> = ledger.iter().map(|r| r.period_return_pct).collect();
        let mut volatility_pct = stdev(&returns, config.stdev_kind);
        if config.volatility_scale == VolatilityScale::Annualized {
            volatility_pct *= MONTHS_PER_YEAR.sqrt();
        }
        if volatility_pct.abs() < VOLATILITY_FLOOR {
            volatility_pct = 0.0;
        }

        let sharpe_like_ratio = if volatility_pct == 0.0 {
            0.0
        } else {
            (annualized_return_pct - config.risk_free_rate_pct) / volatility_pct
        };

        let balances: Vec<f64> = ledger.iter().map(|r| r.ending_balance).collect();

        SimulationSummary {
            final_balance,
            total_return_pct,
            annualized_return_pct,
            average_monthly_return_pct,
            volatility_pct,
            sharpe_like_ratio,
            max_drawdown_pct: compute_drawdown(&balances) * 100.0,
            total_contributed: ledger.iter().map(|r| r.contribution).sum(),
            total_withdrawn: ledger.iter().map(|r| r.withdrawal).sum(),
            months,
        }
    }
}

fn annualize(total_return_pct: f64, months: usize) -> f64 {
    if months == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return_pct / 100.0;
    if growth <= 0.0 || !growth.is_finite() {
        return 0.0;
    }
    (growth.powf(MONTHS_PER_YEAR / months as f64) - 1.0) * 100.0
}

fn stdev(values: &[f64], kind: StdevKind) -> f64 {
    let n = values.len();
    let divisor = match kind {
        StdevKind::Population => n,
        StdevKind::Sample => n.saturating_sub(1),
    };
    if n == 0 || divisor == 0 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / divisor as f64;
    variance.sqrt()
}

/// Largest peak-to-trough decline as a fraction of the peak.
fn compute_drawdown(balances: &[f64]) -> f64 {
    let Some(&first) = balances.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;

    for &balance in balances {
        if balance > peak {
            peak = balance;
        } else if peak > 0.0 {
            let dd = (peak - balance) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
