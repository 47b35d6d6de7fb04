use std::path::PathBuf;
use thiserror::Error;

/// Failures of the on-disk playback store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Duplicate playback record for {file_path} in {}", .path.display())]
    DuplicateRecord {
        path: PathBuf,
        file_path: String,
    },

    #[error("Failed to serialize playback data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to create directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete {}: {source}", .path.display())]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },
}
