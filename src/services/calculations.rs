// src/services/calculations.rs
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

use crate::models::Period;

#[derive(Debug, Error, PartialEq)]
#[error("unparseable reference period '{0}' (expected e.g. 'Aug 2025')")]
pub struct PeriodParseError(pub String);

fn period_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]{3})\s+(\d{4})$").expect("period regex is valid")
    })
}

fn month_from_abbrev(abbrev: &str) -> Option<u32> {
    let month = match abbrev.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parse a reference period such as "Aug 2025".
pub fn parse_reference_period(reference: &str) -> Result<Period, PeriodParseError> {
    let err = || PeriodParseError(reference.to_string());

    let caps = period_regex().captures(reference.trim()).ok_or_else(err)?;
    let month = month_from_abbrev(&caps[1]).ok_or_else(err)?;
    let year = caps[2].parse::<i32>().map_err(|_| err())?;

    Ok(Period::new(year, month))
}

/// The fiscal year whose completion should be checked when `current` is the
/// latest reported month.
pub fn fiscal_year_to_check(current: Period) -> i32 {
    if current.month >= 7 {
        current.fiscal_year() - 1
    } else {
        current.fiscal_year() - 2
    }
}

/// July of `fiscal_year - 1` through June of `fiscal_year`.
pub fn fiscal_year_months(fiscal_year: i32) -> Vec<Period> {
    (7..=12)
        .map(|m| Period::new(fiscal_year - 1, m))
        .chain((1..=6).map(|m| Period::new(fiscal_year, m)))
        .collect()
}

pub fn calculate_average(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
