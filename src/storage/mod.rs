//! File-backed persistence
//!
//! Both persisted records (the cached daily document and the destination
//! registry) are single JSON files replaced atomically: the new content is
//! written to a sibling temp file, synced, renamed over the old file and the
//! parent directory is synced. After a crash either the old or the new record
//! is on disk, never a torn one.
//!
//! - [`cache`] - single-slot store for the current [`crate::models::DailyDocument`]
//! - [`registry`] - guild → destination mapping

pub mod cache;
pub mod registry;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::utils::error::PersistenceError;

pub use cache::CacheStore;
pub use registry::{DestinationRegistry, DestinationSource, RegistryEntry};

/// Atomically replace `path` with `content`
///
/// # Errors
///
/// Returns `PersistenceError::Io` if any filesystem step fails; the previous
/// content of `path` is left untouched in that case
pub async fn atomic_write(path: &Path, content: &[u8]) -> Result<(), PersistenceError> {
    let parent = parent_dir(path);
    fs::create_dir_all(&parent)
        .await
        .map_err(|e| PersistenceError::io(&parent, e))?;

    let tmp_path = temp_path(path);

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .await
        .map_err(|e| PersistenceError::io(&tmp_path, e))?;

    let written = async {
        file.write_all(content).await?;
        file.sync_all().await
    }
    .await;
    drop(file);

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(PersistenceError::io(&tmp_path, e));
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(PersistenceError::io(path, e));
    }

    sync_dir(&parent).await
}

/// Serialize `record` as JSON and atomically write it to `path`
pub async fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<(), PersistenceError> {
    let json = serde_json::to_vec_pretty(record).map_err(PersistenceError::Encode)?;
    atomic_write(path, &json).await
}

/// Read a JSON record; a missing or empty file means "no record yet"
///
/// # Errors
///
/// - `PersistenceError::Io` if the file exists but cannot be read
/// - `PersistenceError::Corrupt` if it does not decode
pub async fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| PersistenceError::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "record".to_string());
    parent_dir(path).join(format!(".{name}.tmp"))
}

#[cfg(unix)]
async fn sync_dir(dir: &Path) -> Result<(), PersistenceError> {
    let handle = fs::File::open(dir)
        .await
        .map_err(|e| PersistenceError::io(dir, e))?;
    handle
        .sync_all()
        .await
        .map_err(|e| PersistenceError::io(dir, e))
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> Result<(), PersistenceError> {
    Ok(())
}
