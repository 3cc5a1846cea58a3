use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EntityError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed row at line {line}: found {found} fields, expected at least {expected}")]
    MalformedRow {
        line: u64,
        found: usize,
        expected: usize,
    },

    #[error("Invalid rule pattern '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl EntityError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EntityError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EntityError>;
