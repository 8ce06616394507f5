// src/services/store.rs
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use tempfile::NamedTempFile;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::TimeSeriesRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("JSON file '{0}' not found")]
    NotFound(PathBuf),
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid JSON format in '{path}': {source}")]
    Invalid { path: PathBuf, source: serde_json::Error },
    #[error("failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("'{0}' was modified by another process since it was loaded; refusing to overwrite")]
    ConcurrentModification(PathBuf),
}

/// The CPI record file. Remembers the bytes it loaded so `save` can refuse to
/// clobber a concurrent writer.
pub struct JsonStore {
    path: PathBuf,
    loaded: String,
}

fn read_file(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            StoreError::NotFound(path.to_path_buf())
        } else {
            StoreError::Read { path: path.to_path_buf(), source }
        }
    })
}

impl JsonStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<(Self, TimeSeriesRecord), StoreError> {
        let path = path.into();
        let loaded = read_file(&path)?;
        let record: TimeSeriesRecord = serde_json::from_str(&loaded)
            .map_err(|source| StoreError::Invalid { path: path.clone(), source })?;

        info!(
            "Loaded '{}': {} monthly, {} yearly entries",
            path.display(),
            record.monthly.len(),
            record.yearly.len()
        );
        Ok((JsonStore { path, loaded }, record))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn render(record: &TimeSeriesRecord) -> Result<String, StoreError> {
        let mut out = serde_json::to_string_pretty(record)?;
        out.push('\n');
        Ok(out)
    }

    /// Fails with `ConcurrentModification` if the file no longer holds what
    /// `open` (or the last `save`) saw, including when it was deleted.
    fn check_unchanged(&self) -> Result<(), StoreError> {
        let current = match read_file(&self.path) {
            Ok(current) => current,
            Err(StoreError::NotFound(_)) => return Err(StoreError::ConcurrentModification(self.path.clone())),
            Err(e) => return Err(e),
        };
        if current != self.loaded {
            return Err(StoreError::ConcurrentModification(self.path.clone()));
        }
        Ok(())
    }

    /// Replace the file with `record`. The new contents go to a uniquely named
    /// sibling temp file that is renamed into place.
    pub fn save(&mut self, record: &TimeSeriesRecord) -> Result<(), StoreError> {
        self.check_unchanged()?;

        let rendered = Self::render(record)?;
        let write_err = |source: io::Error| StoreError::Write { path: self.path.clone(), source };

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        debug!("Writing {} bytes to '{}'", rendered.len(), tmp.path().display());

        tmp.write_all(rendered.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;

        // Narrow the window between the first check and the rename
        self.check_unchanged()?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;

        self.loaded = rendered;
        info!("Data successfully saved to '{}'", self.path.display());
        Ok(())
    }
}
