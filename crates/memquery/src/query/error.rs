//! Structured query errors.

use crate::backend::BackendError;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Error category reported to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    OpenFailure,
    NotFound,
    InvalidAttribute,
    BackendFailure,
    Timeout,
}

/// Errors from session acquisition, resolution and attribute evaluation.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The memory image could not be opened.
    #[error("cannot open memory image '{path}': {reason}")]
    OpenFailure { path: String, reason: String },

    /// The root object (or a navigated-to object) does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The attribute path is malformed or leaves the declared surface.
    #[error("invalid attribute path '{path}': {reason}")]
    InvalidAttribute { path: String, reason: String },

    /// Opaque backend fault.
    #[error("backend failure: {0}")]
    BackendFailure(String),

    /// The query did not finish within the configured limit.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::OpenFailure { .. } => ErrorKind::OpenFailure,
            QueryError::NotFound(_) => ErrorKind::NotFound,
            QueryError::InvalidAttribute { .. } => ErrorKind::InvalidAttribute,
            QueryError::BackendFailure(_) => ErrorKind::BackendFailure,
            QueryError::Timeout(_) => ErrorKind::Timeout,
        }
    }

    pub fn invalid_attribute(path: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidAttribute {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<BackendError> for QueryError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Open { path, reason } => QueryError::OpenFailure { path, reason },
            BackendError::Internal(msg) => QueryError::BackendFailure(msg),
        }
    }
}

pub type QueryResult<T> = Result<T, QueryError>;
