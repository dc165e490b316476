//! Single-slot cache of the current daily document
//!
//! Holds exactly one [`DailyDocument`]. Saving replaces the whole record;
//! there is no history.

use std::path::{Path, PathBuf};

use super::{read_record, write_record};
use crate::models::DailyDocument;
use crate::utils::error::PersistenceError;

/// Persistent store for the most recent document
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Create a store backed by `path`; the file need not exist yet
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached document, `None` on first run
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the file exists but cannot be read or decoded
    pub async fn load(&self) -> Result<Option<DailyDocument>, PersistenceError> {
        read_record(&self.path).await
    }

    /// Replace the cached document; durable once this returns
    ///
    /// # Errors
    ///
    /// Returns `PersistenceError` if the record cannot be written; the previous
    /// document stays readable
    pub async fn save(&self, document: &DailyDocument) -> Result<(), PersistenceError> {
        write_record(&self.path, document).await?;
        tracing::debug!(
            path = %self.path.display(),
            date = %document.date,
            delivered = document.delivered_to.len(),
            "Cache saved"
        );
        Ok(())
    }
}
