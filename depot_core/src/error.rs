//! Error types for the depot_core library.

use std::io;
use uuid::Uuid;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for depot_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A model constant is outside its valid domain
    #[error("Invalid constant: {0}")]
    InvalidConstant(String),

    /// Dose mass is negative or not a finite number
    #[error("Invalid dose mass: {0} mg (must be a finite, non-negative number)")]
    InvalidDoseMass(f64),

    /// No ledger entry with this id
    #[error("Unknown dose entry: {0}")]
    UnknownDose(Uuid),

    /// Unrecognized textual value (time slot, site label, date)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
