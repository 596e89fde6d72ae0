//! Error types for the repset_core library.

use crate::generation::GenerationError;
use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for repset_core operations
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

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A session operation was attempted while no workout is in progress
    #[error("No workout session is in progress")]
    NoActiveSession,

    /// A set index did not address one of the tracked sets
    #[error("Set index {index} is out of range (exercise has {len} sets)")]
    SetIndexOutOfRange { index: usize, len: usize },

    /// A workout with no exercises cannot be started
    #[error("Workout '{0}' has no exercises")]
    EmptyWorkout(String),

    /// Lookup by id or name found nothing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input rejected by a domain rule
    #[error("Invalid input: {0}")]
    Validation(String),

    /// The text-generation service failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
