//! Custom error types for marquee

use thiserror::Error;

/// Main error type for marquee operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("OMDb API key not set: export {0} before running")]
    MissingApiKey(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Input error: {0}")]
    Input(String),

    #[error("No output tables in {0}: run 'marquee run' first")]
    NotLoaded(String),

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("Inconsistent normalization state: {0}")]
    Inconsistency(String),
}

/// Result type alias for marquee
pub type Result<T> = std::result::Result<T, Error>;
