// src/utils/error.rs
use thiserror::Error;

// Errors raised by an extraction call itself. Malformed documents never end up here,
// only requests that cannot be served.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Items {requested:?} do not match the items for {form_type} filings")]
    GrammarMismatch {
        form_type: String,
        requested: Vec<String>,
    },

    #[error("Invalid filing date '{0}': expected YYYY-MM-DD or YYYYMMDD")]
    InvalidDate(String),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("File already exists: {0}")]
    FileExists(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}
