//! Capital evolution engine.
//!
//! [`SimulationParameters`] describe one run. [`run_simulation`] validates
//! them, builds the month-end timeline and steps the balance forward one
//! month at a time, recording a [`LedgerRow`] per month.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::blender::{self, BlendPolicy};
use crate::domain::error::{CalculationFault, CapsimError};
use crate::domain::series::IndicatorSeries;
use crate::domain::timeline::{self, StartPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub initial_capital: f64,
    pub monthly_contribution: f64,
    pub monthly_withdrawal: f64,
    pub reinvest_withdrawals: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_policy: StartPolicy,
}

impl SimulationParameters {
    pub fn validate(&self) -> Result<(), CapsimError> {
        if !self.initial_capital.is_finite() {
            return Err(CapsimError::validation(
                "initial_capital",
                "must be a finite number",
            ));
        }
        if self.initial_capital <= 0.0 {
            return Err(CapsimError::validation(
                "initial_capital",
                "must be positive",
            ));
        }
        for (field, value) in [
            ("monthly_contribution", self.monthly_contribution),
            ("monthly_withdrawal", self.monthly_withdrawal),
        ] {
            if !value.is_finite() {
                return Err(CapsimError::validation(field, "must be a finite number"));
            }
            if value < 0.0 {
                return Err(CapsimError::validation(field, "must be non-negative"));
            }
        }
        if self.start_date >= self.end_date {
            return Err(CapsimError::validation(
                "start_date",
                "start_date must be before end_date",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub date: NaiveDate,
    pub period_start_balance: f64,
    pub contribution: f64,
    pub withdrawal: f64,
    pub period_return_pct: f64,
    pub ending_balance: f64,
    pub indicators_resolved: usize,
}

/// Output of one engine run. Owns everything it needs; nothing is kept
/// between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRun {
    pub parameters: SimulationParameters,
    pub indicator_names: Vec<String>,
    pub blend_policy: BlendPolicy,
    pub ledger: Vec<LedgerRow>,
}

impl SimulationRun {
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.ledger.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.ledger.last().map(|r| r.date)
    }

    pub fn final_balance(&self) -> Option<f64> {
        self.ledger.last().map(|r| r.ending_balance)
    }
}

/// Ending balance for one month.
pub fn step_balance(
    balance: f64,
    period_return_pct: f64,
    contribution: f64,
    withdrawal: f64,
    reinvest_withdrawals: bool,
) -> f64 {
    let after_return = balance * (1.0 + period_return_pct / 100.0);
    if reinvest_withdrawals {
        after_return + contribution
    } else {
        after_return - withdrawal + contribution
    }
}

pub fn run_simulation(
    params: &SimulationParameters,
    indicators: &BTreeMap<String, IndicatorSeries>,
    policy: BlendPolicy,
) -> Result<SimulationRun, CapsimError> {
    params.validate()?;

    let start = timeline::resolve_start(
        params.start_policy,
        params.start_date,
        params.end_date,
        indicators,
    );
    let months = timeline::month_ends(start, params.end_date);
    let Some((&first, rest)) = months.split_first() else {
        return Err(CapsimError::validation(
            "end_date",
            format!("no month-end between {start} and {}", params.end_date),
        ));
    };

    tracing::info!(
        start = %first,
        end = %params.end_date,
        months = months.len(),
        indicators = indicators.len(),
        %policy,
        "starting simulation"
    );

    let withdrawal_applied = if params.reinvest_withdrawals {
        0.0
    } else {
        params.monthly_withdrawal
    };

    let mut ledger = Vec::with_capacity(months.len());
    ledger.push(LedgerRow {
        date: first,
        period_start_balance: params.initial_capital,
        contribution: 0.0,
        withdrawal: 0.0,
        period_return_pct: 0.0,
        ending_balance: params.initial_capital,
        indicators_resolved: 0,
    });

    let mut balance = params.initial_capital;

    for (step, &month) in rest.iter().enumerate() {
        let outcome = blender::blend(month, indicators, policy);
        let ending = step_balance(
            balance,
            outcome.return_pct,
            params.monthly_contribution,
            params.monthly_withdrawal,
            params.reinvest_withdrawals,
        );

        if !ending.is_finite() {
            return Err(CapsimError::Calculation {
                context: format!("stepping month {} of {}", step + 2, months.len()),
                source: CalculationFault::NonFiniteBalance {
                    date: month,
                    balance: ending,
                },
            });
        }

        ledger.push(LedgerRow {
            date: month,
            period_start_balance: balance,
            contribution: params.monthly_contribution,
            withdrawal: withdrawal_applied,
            period_return_pct: outcome.return_pct,
            ending_balance: ending,
            indicators_resolved: outcome.resolved,
        });

        balance = ending;
    }

    tracing::info!(final_balance = balance, rows = ledger.len(), "simulation finished");

    Ok(SimulationRun {
        parameters: params.clone(),
        indicator_names: indicators.keys().cloned().collect(),
        blend_policy: policy,
        ledger,
    })
}
