//! Error types for the flow_core library.
//!
//! The execution engine itself never fails: illegal commands are no-ops.
//! These errors come from the collaborators around it (workout library,
//! configuration, step listeners).

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for flow_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Workout failed authoring validation
    #[error("Invalid workout: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Workout lookup by id failed
    #[error("Workout not found: {0}")]
    NotFound(String),

    /// A step listener (sound/speech) failed
    #[error("Listener error: {0}")]
    Listener(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}
