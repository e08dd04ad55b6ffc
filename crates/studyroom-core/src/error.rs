//! Core error types for studyroom-core.
//!
//! Engines only ever fail with a [`SchedulingError`]: a deterministic
//! precondition violation on an otherwise pure computation. Everything that
//! touches disk or the database is wrapped by [`CoreError`].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::session::SessionState;

/// Logical failures raised by the scheduling engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// Recall quality outside `again | hard | good | easy`.
    #[error("Invalid recall quality '{value}': expected 1-4 or again/hard/good/easy")]
    InvalidQuality { value: String },

    /// Policy or configuration bounds are inconsistent.
    #[error("Invalid policy value for '{field}': {message}")]
    InvalidPolicy { field: String, message: String },

    /// The task has no recurrence rule or no due date.
    #[error("Task '{task_id}' has no recurrence configured")]
    NoRecurrenceConfigured { task_id: String },

    /// The next occurrence would land after the rule's end date.
    #[error("Recurrence of task '{task_id}' ended: next due {next_due} is after {end_at}")]
    RecurrenceEnded {
        task_id: String,
        next_due: DateTime<Utc>,
        end_at: DateTime<Utc>,
    },

    /// The session state machine does not allow this action.
    #[error("Cannot {action} a {state} session")]
    InvalidTransition {
        state: SessionState,
        action: &'static str,
    },
}

impl SchedulingError {
    pub(crate) fn invalid_policy(field: &str, message: impl Into<String>) -> Self {
        SchedulingError::InvalidPolicy {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Core error type for studyroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Rejected scheduling action
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timer command with no session to act on
    #[error("No active session")]
    NoActiveSession,

    /// `start-pending` with nothing decided
    #[error("No pending session to start")]
    NoPendingSession,
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,

    /// No row with this id
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },
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

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Could not determine where configuration lives
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(inner, _msg) => {
                if inner.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<rusqlite::Error> for CoreError {
    fn from(err: rusqlite::Error) -> Self {
        CoreError::Database(err.into())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
