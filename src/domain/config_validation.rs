//! Configuration validation.
//!
//! Checks every section a simulation reads before any data is loaded, so
//! that a bad file fails fast with the offending section and key.

use crate::domain::blender::BlendPolicy;
use crate::domain::error::CapsimError;
use crate::domain::normalizer::IndicatorSpec;
use crate::domain::series::IndicatorKind;
use crate::domain::statistics::{StdevKind, VolatilityScale};
use crate::domain::timeline::StartPolicy;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::str::FromStr;

pub fn validate_simulation_config(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    validate_initial_capital(config)?;
    validate_flows(config)?;
    parse_flag(config, "simulation", "reinvest_withdrawals", false)?;
    validate_dates(config)?;
    validate_choice::<StartPolicy>(config, "simulation", "start_policy")?;
    validate_choice::<BlendPolicy>(config, "blend", "denominator")?;
    Ok(())
}

pub fn validate_statistics_config(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    let rate = parse_number(config, "statistics", "risk_free_rate", 0.0)?;
    if rate <= -100.0 {
        return Err(CapsimError::ConfigInvalid {
            section: "statistics".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be a percentage above -100".to_string(),
        });
    }
    validate_choice::<VolatilityScale>(config, "statistics", "volatility")?;
    validate_choice::<StdevKind>(config, "statistics", "stdev")?;
    Ok(())
}

/// Every name in `[indicators] names` needs an `[indicator.NAME]` section
/// with a known kind and a source id.
pub fn validate_indicator_config(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    let names = config.get_list("indicators", "names");
    let mut seen = Vec::with_capacity(names.len());

    for name in &names {
        let key = name.to_lowercase();
        if seen.contains(&key) {
            return Err(CapsimError::ConfigInvalid {
                section: "indicators".to_string(),
                key: "names".to_string(),
                reason: format!("indicator '{name}' listed more than once"),
            });
        }
        seen.push(key);

        let section = indicator_section(name);
        match config.get_string(&section, "source") {
            Some(s) if !s.trim().is_empty() => {}
            _ => {
                return Err(CapsimError::ConfigMissing {
                    section,
                    key: "source".to_string(),
                });
            }
        }
        match config.get_string(&section, "kind") {
            None => {
                return Err(CapsimError::ConfigMissing {
                    section,
                    key: "kind".to_string(),
                });
            }
            Some(kind) => {
                IndicatorKind::from_str(&kind).map_err(|reason| CapsimError::ConfigInvalid {
                    section: section.clone(),
                    key: "kind".to_string(),
                    reason,
                })?;
            }
        }
    }
    Ok(())
}

pub fn indicator_section(name: &str) -> String {
    format!("indicator.{name}")
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    let value = parse_number(config, "simulation", "initial_capital", 0.0)?;
    if value <= 0.0 {
        return Err(CapsimError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "initial_capital".to_string(),
            reason: "initial_capital must be positive".to_string(),
        });
    }
    Ok(())
}

fn validate_flows(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    for key in ["monthly_contribution", "monthly_withdrawal"] {
        let value = parse_number(config, "simulation", key, 0.0)?;
        if value < 0.0 {
            return Err(CapsimError::ConfigInvalid {
                section: "simulation".to_string(),
                key: key.to_string(),
                reason: format!("{key} must be non-negative"),
            });
        }
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), CapsimError> {
    let start_date = parse_date(config, "start_date")?;
    let end_date = parse_date(config, "end_date")?;

    if start_date >= end_date {
        return Err(CapsimError::ConfigInvalid {
            section: "simulation".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

/// Reads a required `YYYY-MM-DD` key from `[simulation]`.
pub fn parse_date(config: &dyn ConfigPort, field: &str) -> Result<NaiveDate, CapsimError> {
    match config.get_string("simulation", field) {
        None => Err(CapsimError::ConfigMissing {
            section: "simulation".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            CapsimError::ConfigInvalid {
                section: "simulation".to_string(),
                key: field.to_string(),
                reason: format!("invalid {field} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

const KNOWN_SECTIONS: [&str; 7] = [
    "simulation",
    "blend",
    "statistics",
    "data",
    "indicators",
    "history",
    "report",
];

/// Sections that no part of a run reads, typically a misspelled name or an
/// `[indicator.NAME]` left out of `[indicators] names`.
pub fn unused_sections(sections: &[String], specs: &[IndicatorSpec]) -> Vec<String> {
    sections
        .iter()
        .filter(|section| {
            let section = section.to_lowercase();
            !KNOWN_SECTIONS.contains(&section.as_str())
                && !specs
                    .iter()
                    .any(|spec| indicator_section(&spec.name).to_lowercase() == section)
        })
        .cloned()
        .collect()
}

/// Optional numeric key; absent means `default`. A decimal comma is accepted.
pub fn parse_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, CapsimError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| CapsimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' must be a number"),
        })
}

/// Optional boolean key; absent means `default`.
pub fn parse_flag(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, CapsimError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CapsimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{raw}' must be true or false"),
        }),
    }
}

/// Optional enum-valued key; absent means the type's default.
pub fn parse_choice<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<T, CapsimError>
where
    T: FromStr<Err = String> + Default,
{
    match config.get_string(section, key) {
        None => Ok(T::default()),
        Some(raw) => raw.parse::<T>().map_err(|reason| CapsimError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason,
        }),
    }
}

fn validate_choice<T>(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), CapsimError>
where
    T: FromStr<Err = String> + Default,
{
    parse_choice::<T>(config, section, key).map(|_| ())
}
