// src/handlers/update.rs
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::fs;
use std::path::PathBuf;

use crate::models::{ScrapedObservation, TimeSeriesRecord};
use crate::services::{
    extractor::extract_observation,
    fetch::fetch_document,
    merger::{merge_observation, MergeEvent, MergeOutcome},
    store::JsonStore,
};
use super::error::UpdateError;

pub const DEFAULT_INDICATOR: &str = "Consumer Price Index CPI";
pub const DEFAULT_FILE: &str = "pk-cpi.json";

#[derive(Debug, Clone)]
pub enum DocumentSource {
    Url(String),
    /// A page saved to disk earlier.
    File(PathBuf),
}

#[derive(Debug, Clone)]
pub struct UpdateConfig {
    pub file: PathBuf,
    pub source: DocumentSource,
    pub indicator: String,
    pub dry_run: bool,
}

#[derive(Debug)]
pub struct UpdateSummary {
    pub observation: ScrapedObservation,
    pub outcome: MergeOutcome,
    pub saved: bool,
}

pub async fn load_document(source: &DocumentSource) -> Result<String, UpdateError> {
    match source {
        DocumentSource::Url(url) => Ok(fetch_document(url).await?),
        DocumentSource::File(path) => {
            info!("Reading saved page from '{}'", path.display());
            fs::read_to_string(path).map_err(|source| UpdateError::Document { path: path.clone(), source })
        }
    }
}

/// Extract and merge without any I/O.
pub fn apply_document(
    record: &TimeSeriesRecord,
    html: &str,
    indicator: &str,
    today: NaiveDate,
) -> Result<(ScrapedObservation, MergeOutcome), UpdateError> {
    let observation = extract_observation(html, indicator)?;
    info!("Scraped data:");
    info!("  Reference date: {}", observation.reference_period);
    info!("  Last value: {}", observation.last_value);
    info!("  Previous value: {}", observation.previous_value);

    let outcome = merge_observation(record, &observation, today)?;
    info!(
        "Parsed months - Current: {}, Previous: {}",
        outcome.current_month, outcome.previous_month
    );
    Ok((observation, outcome))
}

pub fn log_event(event: &MergeEvent) {
    match event {
        MergeEvent::PreviousMonthConfirmed { month, value } => {
            info!("Previous month ({}) value validated: {}", month, value)
        }
        MergeEvent::PreviousMonthAdded { month, value } => {
            info!("Added previous month data: {} = {}", month, value)
        }
        MergeEvent::CurrentMonthAdded { month, value } => {
            info!("Added current month data: {} = {}", month, value)
        }
        MergeEvent::CurrentMonthUnchanged { month, value } => {
            info!("Current month ({}) unchanged: {}", month, value)
        }
        MergeEvent::CurrentMonthRevised { month, old, new } => {
            warn!("Updating current month {} value from {} to {}", month, old, new)
        }
        MergeEvent::FiscalYearAlreadyRecorded { fiscal_year, value } => {
            debug!("Fiscal year {} data already exists: {}", fiscal_year, value)
        }
        MergeEvent::FiscalYearIncomplete { fiscal_year, missing } => {
            info!(
                "Cannot calculate fiscal year {} average yet, missing months: {:?}",
                fiscal_year, missing
            )
        }
        MergeEvent::FiscalYearComputed { fiscal_year, average } => {
            info!(
                "Added fiscal year {} average: {:.4} (July {} to June {})",
                fiscal_year,
                average,
                fiscal_year - 1,
                fiscal_year
            )
        }
        MergeEvent::MetadataStamped { date } => debug!("lastUpdated set to {}", date),
    }
}

/// One full update: load the record, get the page, merge, save.
pub async fn run_update(config: &UpdateConfig, today: NaiveDate) -> Result<UpdateSummary, UpdateError> {
    info!("Starting CPI data update...");
    let (mut store, record) = JsonStore::open(&config.file)?;

    let html = load_document(&config.source).await?;
    let (observation, outcome) = apply_document(&record, &html, &config.indicator, today)?;

    for event in &outcome.events {
        log_event(event);
    }

    let saved = if config.dry_run {
        info!("Dry run: not writing '{}'", store.path().display());
        false
    } else {
        store.save(&outcome.record)?;
        true
    };

    info!(
        "CPI data update completed: {} monthly, {} yearly entries",
        outcome.record.monthly.len(),
        outcome.record.yearly.len()
    );

    Ok(UpdateSummary { observation, outcome, saved })
}
