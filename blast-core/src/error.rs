/// Error types for loading blast records
use thiserror::Error;

/// Failure to turn an upload or a fetched document into records.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The upload had a header line but no data rows
    #[error("Upload needs a header line and at least one data row (found {lines} line(s))")]
    NoDataRows { lines: usize },

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse the JSON document
    #[error("Failed to parse JSON document: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Failed to read the upload from disk
    #[error("Failed to read upload: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results using SourceError
pub type Result<T> = std::result::Result<T, SourceError>;
