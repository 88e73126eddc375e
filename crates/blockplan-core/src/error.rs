//! Core error types for blockplan-core.
//!
//! Input-shape problems surface as [`ValidationError`] before any packing
//! happens. Invariant violations found after packing are programmer errors
//! and are reported through [`CoreError::InvariantViolation`].

use std::path::PathBuf;
use thiserror::Error;

use crate::scheduler::Violation;

/// Core error type for blockplan-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The produced schedule broke a packing invariant
    #[error("Schedule invariant violated: {}", format_violations(.0))]
    InvariantViolation(Vec<Violation>),

    /// Drafts were requested for release without an explicit confirmation
    #[error("Confirmation required: {count} draft(s) were not released")]
    ConfirmationRequired { count: usize },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Could not determine where configuration lives
    #[error("Configuration directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid time range
    #[error("Invalid time range: end ({end}) must be greater than start ({start})")]
    InvalidTimeRange {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    /// A goal failed its duration checks
    #[error("Invalid goal '{goal_id}': {message}")]
    InvalidGoal { goal_id: String, message: String },

    /// Two goals share an id
    #[error("Duplicate goal id: {0}")]
    DuplicateGoal(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    pub(crate) fn goal(goal_id: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidGoal {
            goal_id: goal_id.to_string(),
            message: message.into(),
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
