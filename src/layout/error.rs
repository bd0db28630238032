use std::io::Error as IoError;

/// Errors that can occur while locating or loading a storage layout.
#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    /// The compiler output could not be read.
    #[error("Failed to read compiler output: {0}")]
    Io(#[from] IoError),
    /// The compiler output is not valid JSON, or the layout section is malformed.
    #[error("Failed to parse storage layout: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to find contract {0} in compiler output")]
    ContractNotFound(String),
    #[error(
        "Storage layout for {0} not found. Enable the `storageLayout` output selection in the compiler settings"
    )]
    MissingStorageLayout(String),
    #[error("Invalid slot `{slot}` for variable {label}")]
    InvalidSlot { label: String, slot: String },
    #[error("Invalid offset {offset} for variable {label}")]
    InvalidOffset { label: String, offset: usize },
    #[error("Malformed type {id}: {reason}")]
    MalformedType { id: String, reason: String },
}
