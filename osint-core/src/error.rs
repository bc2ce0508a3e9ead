//! Error types for the dashboard core

use thiserror::Error;

/// Workspace-wide error type
///
/// Per-vendor failures are not represented here; they travel as
/// [`AdapterError`](crate::AdapterError) values inside a search so one
/// vendor never fails another.
#[derive(Error, Debug)]
pub enum OsintError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl OsintError {
    pub fn config(msg: impl Into<String>) -> Self {
        OsintError::Configuration(msg.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        OsintError::InvalidQuery(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        OsintError::NotFound(msg.into())
    }
}

/// Result type alias for dashboard operations
pub type OsintResult<T> = Result<T, OsintError>;
