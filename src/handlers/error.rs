// src/handlers/error.rs
use std::path::PathBuf;
use thiserror::Error;

use crate::services::{
    extractor::ExtractionError, fetch::FetchError, merger::MergeError, store::StoreError,
};

/// Everything that can end an update run. None of these are retried.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to read saved page '{path}': {source}")]
    Document { path: PathBuf, source: std::io::Error },
    #[error("error parsing data: {0}")]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}
