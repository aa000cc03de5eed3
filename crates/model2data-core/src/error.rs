use std::path::PathBuf;

use thiserror::Error;

/// Core error type shared across model2data crates.
#[derive(Debug, Error)]
pub enum Error {
    /// The schema source does not exist.
    #[error("schema file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Parsing finished without producing a single table.
    #[error("no tables found in schema")]
    EmptySchema,
    /// Any other failure while reading the schema source.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for results returned by model2data crates.
pub type Result<T> = std::result::Result<T, Error>;
