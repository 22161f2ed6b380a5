/// Error types shared by the cvd crates
use thiserror::Error;

/// Main error type for data loading and configuration.
///
/// Recoverable data conditions (unknown regions, malformed values, too little
/// data for a projection) never surface here; they are absorbed into empty
/// or default values by the component that detects them.
#[derive(Error, Debug)]
pub enum CovidError {
    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// Server answered with a non-success status
    #[error("Bad response status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Failed to parse CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Failed to parse or serialize JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Local IO failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Date parsing failed
    #[error("Failed to parse date: {0}")]
    DateParse(String),

    /// Region has no backing file in the metadata document
    #[error("No backing file for region: {0}")]
    MissingFile(String),

    /// Persisted cache failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Type alias for Results using CovidError
pub type Result<T> = std::result::Result<T, CovidError>;
