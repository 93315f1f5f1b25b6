//! Error types

use std::path::PathBuf;

use thiserror::Error;

/// A failure reported by a [`RecordStore`](crate::traits::RecordStore)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store is unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} for {path}")]
    Status { path: String, status: u16 },

    #[error("invalid store path {0:?}")]
    InvalidPath(String),

    #[error("unable to encode or decode a record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("{path} was modified concurrently too many times")]
    Conflict { path: String },

    #[error("{path} does not hold a counter")]
    NotACounter { path: String },

    #[error("subscriptions require a running tokio runtime")]
    NoRuntime,
}

/// A draft that cannot be submitted. No store call is made when this happens.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("a start date is required")]
    MissingStart,

    #[error("field {field} is not a valid date: {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("the end date precedes the start date")]
    EndBeforeStart,

    #[error("field {0} must not be blank")]
    Blank(&'static str),
}

/// Failure of a mutating [`Repository`](crate::repository::Repository) operation
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure of a [`SchedulingForm`](crate::form::SchedulingForm) action
#[derive(Debug, Error)]
pub enum FormError {
    #[error("cannot {action} while the form is {state}")]
    InvalidTransition { action: &'static str, state: &'static str },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<RepositoryError> for FormError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Validation(e) => FormError::Validation(e),
            RepositoryError::Store(e) => FormError::Store(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid store URL {value:?}: {source}")]
    Url {
        value: String,
        #[source]
        source: url::ParseError,
    },
}
