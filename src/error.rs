//! Error types for store, transport and record operations.
//!
//! Transport functions never fail with an `Err` for ordinary HTTP problems:
//! the failure travels inside the [`Response`](crate::Response) as a
//! [`NetworkError`]. Record operations (`save`, `remove`, `save_relationship`)
//! turn that value into an [`Error::Network`] so callers can use `?`.

use thiserror::Error;

/// Result type for store and record operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A failure captured by the transport pipeline.
///
/// Cloneable because a single memoized response may be inspected by many
/// callers of a cached link fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The fetch primitive itself failed (connection refused, DNS, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a status of 400 or above.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// The response body could not be parsed as JSON.
    #[error("body parse error: {0}")]
    Body(String),
}

impl NetworkError {
    /// Build the synthetic error for an HTTP status of 400 or above.
    pub fn status(status: u16) -> Self {
        NetworkError::Status {
            status,
            message: format!("Invalid HTTP status: {}", status),
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Error type for the identity-mapped collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("collection lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("record not found: {type_name}:{id}")]
    NotFound { type_name: String, id: String },
}

/// Top-level error for store and record operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The server or transport failed; raised from a response's `error`.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// Collection-level failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// `save_relationship` was called for a relationship without a `self` link.
    #[error("the relationship {relationship} doesn't have a defined link")]
    MissingRelationshipLink { relationship: String },

    /// The record has no reference registered under this name.
    #[error("unknown relationship: {0}")]
    UnknownRelationship(String),

    /// The record or response is not attached to a live store.
    #[error("{0} is not attached to a store")]
    Detached(String),

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialize(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialize(err.to_string())
    }
}

impl Error {
    /// HTTP status of the underlying network error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Network(e) => e.status_code(),
            _ => None,
        }
    }

    /// True for caller misuse rather than server or transport failure.
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Error::MissingRelationshipLink { .. }
                | Error::UnknownRelationship(_)
                | Error::Detached(_)
        )
    }
}
