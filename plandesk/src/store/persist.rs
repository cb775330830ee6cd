//! Snapshot persistence for [`InMemoryStore`].
//!
//! The data file is written to a sibling temp file and renamed into place so
//! a crash mid-write never leaves a truncated snapshot behind.

use std::path::{Path, PathBuf};

use plandesk_proto::codec::{self, CodecError};

use super::memory::InMemoryStore;

/// Errors that can occur while loading or saving a data file.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Reading or writing the file failed.
    #[error("failed to access data file {path}: {source}")]
    Io {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file exists but is not a valid snapshot.
    #[error("corrupt data file: {0}")]
    Codec(#[from] CodecError),
}

/// Loads a store from `path`. A missing file yields an empty store.
///
/// # Errors
///
/// Returns [`PersistError::Io`] if the file exists but cannot be read, or
/// [`PersistError::Codec`] if it does not decode.
pub fn load(path: &Path) -> Result<InMemoryStore, PersistError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            let snapshot = codec::decode_snapshot(&bytes)?;
            tracing::debug!(
                path = %path.display(),
                documents = snapshot.records.len(),
                "loaded data file"
            );
            Ok(InMemoryStore::from_snapshot(snapshot))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "no data file yet, starting empty");
            Ok(InMemoryStore::new())
        }
        Err(e) => Err(PersistError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Writes every document in `store` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`PersistError`] if encoding fails or the file cannot be written.
pub fn save(store: &InMemoryStore, path: &Path) -> Result<(), PersistError> {
    let io_err = |source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    };
    let snapshot = store.snapshot();
    let bytes = codec::encode_snapshot(&snapshot)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(io_err)?;

    tracing::debug!(
        path = %path.display(),
        documents = snapshot.records.len(),
        "saved data file"
    );
    Ok(())
}
