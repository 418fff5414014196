#![forbid(unsafe_code)]

//! Core domain model and execution engine for Flowtimer.
//!
//! This crate provides:
//! - Domain types (timers, sections, workouts, progress)
//! - Flattening of nested, repeating sections into a linear step sequence
//! - The countdown state machine and its async runner
//! - Listener notifications and announcements
//! - Persistence (JSON workout library, config)

pub mod types;
pub mod error;
pub mod format;
pub mod validate;
pub mod flatten;
pub mod machine;
pub mod runner;
pub mod listener;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod library;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use flatten::flatten;
pub use machine::{Effect, Event, Execution};
pub use runner::{RunnerConfig, WorkoutRunner};
pub use listener::{announcement, Announcement, NoopListener, StepListener, TracingListener};
#[cfg(test)]
pub(crate) use listener::recording::{ListenerEvent, RecordingListener};
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::Config;
pub use library::{JsonLibrary, WorkoutRepository};
