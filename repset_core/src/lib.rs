#![forbid(unsafe_code)]

//! Core domain model and business logic for repset.
//!
//! This crate provides:
//! - Domain types (exercises, workouts, tracked sets, history records)
//! - The workout session state machine
//! - The free-text exercise suggestion parser
//! - The generation-service seam and its error taxonomy
//! - Persistence (workout library, preferences, JSONL history, CSV export)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod store;
pub mod library;
pub mod preferences;
pub mod history;
pub mod csv_export;
pub mod session;
pub mod parser;
pub mod generation;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{Config, DataPaths};
pub use library::{parse_exercise_spec, WorkoutLibrary};
pub use preferences::Preferences;
pub use history::{format_duration, read_history, HistorySink, JsonlHistorySink};
pub use csv_export::export_csv;
pub use session::{ActiveSession, SessionEngine, SessionState, SessionStep};
pub use parser::{parse_line, parse_suggestions};
pub use generation::{
    suggest_exercises, GenerationError, GenerationErrorKind, GenerationService,
};
