use thiserror::Error;

use super::keys::StorageKey;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error for '{key}': {source}")]
    Io {
        key: StorageKey,
        source: std::io::Error,
    },

    #[error("Could not serialize '{key}': {source}")]
    Serialization {
        key: StorageKey,
        source: serde_json::Error,
    },

    #[error("Persistence writer has stopped")]
    WriterClosed,
}
