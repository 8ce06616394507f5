// src/services/merger.rs
//! Folds one scraped observation into the stored series.
//!
//! `merge_observation` never touches its input record. It either returns a
//! fully updated copy plus the events describing what changed, or an error
//! and no record at all, so a failed run can never leave a half-merged file.
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{Period, ScrapedObservation, TimeSeriesRecord};
use super::calculations::{
    calculate_average, fiscal_year_months, fiscal_year_to_check, parse_reference_period,
    round_to, PeriodParseError,
};

/// Largest month-over-month drop accepted as real.
pub const MAX_MONTHLY_DROP: f64 = 100.0;
/// Stored and scraped values no further apart than this are the same reading.
pub const VALUE_TOLERANCE: f64 = 0.01;
pub const YEARLY_DECIMALS: i32 = 4;

#[derive(Debug, Error, PartialEq)]
pub enum MergeError {
    #[error(transparent)]
    PeriodParse(#[from] PeriodParseError),
    #[error("value out of plausible range: {0}")]
    Plausibility(String),
    #[error("historical value conflict for {month}: stored {stored} vs scraped {scraped}")]
    Consistency { month: String, stored: f64, scraped: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MergeEvent {
    PreviousMonthConfirmed { month: String, value: f64 },
    PreviousMonthAdded { month: String, value: f64 },
    CurrentMonthAdded { month: String, value: f64 },
    CurrentMonthUnchanged { month: String, value: f64 },
    /// The latest month is provisional upstream and was revised.
    CurrentMonthRevised { month: String, old: f64, new: f64 },
    FiscalYearAlreadyRecorded { fiscal_year: i32, value: f64 },
    FiscalYearIncomplete { fiscal_year: i32, missing: Vec<String> },
    FiscalYearComputed { fiscal_year: i32, average: f64 },
    MetadataStamped { date: String },
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub record: TimeSeriesRecord,
    pub current_month: Period,
    pub previous_month: Period,
    pub events: Vec<MergeEvent>,
}

/// Readings that differ by no more than `VALUE_TOLERANCE`. The slack absorbs
/// binary rounding, so 120.50 and 120.51 still count as the same reading.
pub fn same_reading(a: f64, b: f64) -> bool {
    (a - b).abs() <= VALUE_TOLERANCE + 1e-9
}

pub fn validate_values(current: f64, previous: f64) -> Result<(), MergeError> {
    if !current.is_finite() || !previous.is_finite() {
        return Err(MergeError::Plausibility(format!(
            "CPI values must be finite (current {}, previous {})",
            current, previous
        )));
    }

    if current <= 0.0 || previous <= 0.0 {
        return Err(MergeError::Plausibility(format!(
            "CPI values must be positive (current {}, previous {})",
            current, previous
        )));
    }

    if current < previous - MAX_MONTHLY_DROP {
        return Err(MergeError::Plausibility(format!(
            "CPI dropped by {:.2} points (from {} to {})",
            previous - current,
            previous,
            current
        )));
    }

    Ok(())
}

fn merge_monthly(
    record: &mut TimeSeriesRecord,
    current: Period,
    previous: Period,
    obs: &ScrapedObservation,
    events: &mut Vec<MergeEvent>,
) -> Result<(), MergeError> {
    let prev_key = previous.key();
    match record.monthly.get(&prev_key) {
        Some(&stored) if !same_reading(stored, obs.previous_value) => {
            return Err(MergeError::Consistency {
                month: prev_key,
                stored,
                scraped: obs.previous_value,
            });
        }
        Some(&stored) => events.push(MergeEvent::PreviousMonthConfirmed {
            month: prev_key,
            value: stored,
        }),
        None => {
            record.monthly.insert(prev_key.clone(), obs.previous_value);
            events.push(MergeEvent::PreviousMonthAdded {
                month: prev_key,
                value: obs.previous_value,
            });
        }
    }

    let cur_key = current.key();
    let event = match record.monthly.insert(cur_key.clone(), obs.last_value) {
        Some(old) if !same_reading(old, obs.last_value) => MergeEvent::CurrentMonthRevised {
            month: cur_key,
            old,
            new: obs.last_value,
        },
        Some(_) => MergeEvent::CurrentMonthUnchanged {
            month: cur_key,
            value: obs.last_value,
        },
        None => MergeEvent::CurrentMonthAdded {
            month: cur_key,
            value: obs.last_value,
        },
    };
    events.push(event);

    Ok(())
}

/// Fill in the fiscal-year average that `current` makes due, if every month
/// of it is on record. Existing averages are never recomputed.
pub fn update_fiscal_year(record: &mut TimeSeriesRecord, current: Period) -> MergeEvent {
    let fiscal_year = fiscal_year_to_check(current);
    let key = fiscal_year.to_string();

    if let Some(&value) = record.yearly.get(&key) {
        return MergeEvent::FiscalYearAlreadyRecorded { fiscal_year, value };
    }

    let mut values = Vec::with_capacity(12);
    let mut missing = Vec::new();
    for month in fiscal_year_months(fiscal_year) {
        match record.monthly.get(&month.key()) {
            Some(&v) => values.push(v),
            None => missing.push(month.key()),
        }
    }

    if !missing.is_empty() {
        return MergeEvent::FiscalYearIncomplete { fiscal_year, missing };
    }

    let average = round_to(calculate_average(&values), YEARLY_DECIMALS);
    record.yearly.insert(key, average);
    MergeEvent::FiscalYearComputed { fiscal_year, average }
}

pub fn merge_observation(
    record: &TimeSeriesRecord,
    obs: &ScrapedObservation,
    today: NaiveDate,
) -> Result<MergeOutcome, MergeError> {
    let current_month = parse_reference_period(&obs.reference_period)?;
    let previous_month = current_month.previous();

    validate_values(obs.last_value, obs.previous_value)?;

    let mut updated = record.clone();
    let mut events = Vec::new();

    merge_monthly(&mut updated, current_month, previous_month, obs, &mut events)?;
    events.push(update_fiscal_year(&mut updated, current_month));

    let date = today.format("%Y-%m-%d").to_string();
    updated.metadata.last_updated = Some(date.clone());
    events.push(MergeEvent::MetadataStamped { date });

    Ok(MergeOutcome {
        record: updated,
        current_month,
        previous_month,
        events,
    })
}
