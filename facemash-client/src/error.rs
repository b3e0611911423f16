//! Error types for the client core
//!
//! [`GatewayError`] is the only failure shape that leaves the request
//! gateway; every transport, status and decoding problem is folded into one
//! of four [`ErrorKind`]s. [`DuoError`] adds the domain failures of the
//! voting session on top.

use std::time::Duration;

use facemash_common::PersonId;
use serde::Serialize;
use thiserror::Error;

/// Classification of a failed gateway call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Transport failure or timeout
    NetworkError,
    /// Response did not have the expected shape
    ValidationError,
    /// Missing or rejected credential (HTTP 401/403)
    AuthError,
    /// Anything else, including backend-reported failures
    UnknownError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::NetworkError => "Network error",
            ErrorKind::ValidationError => "Validation error",
            ErrorKind::AuthError => "Auth error",
            ErrorKind::UnknownError => "Unknown error",
        };
        f.write_str(label)
    }
}

/// Failed gateway call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NetworkError, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AuthError, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }
}

/// Failures of the duo voting session
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DuoError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("Duo fetch returned {0} candidate(s), need 2")]
    InsufficientCandidates(usize),

    #[error("Duo contains person {0} twice")]
    SelfPaired(PersonId),

    #[error("Person {0} does not belong to the requested gender")]
    ScopeMismatch(PersonId),

    #[error("Refill kept returning the pair just voted on ({0}, {1})")]
    RepeatedPair(PersonId, PersonId),

    #[error("Vote rejected by backend: {0}")]
    VoteRejected(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl DuoError {
    /// Map a failed vote call: backend refusals become `VoteRejected`,
    /// transport problems stay gateway errors
    pub fn from_vote_failure(error: GatewayError) -> Self {
        match error.kind {
            ErrorKind::UnknownError => DuoError::VoteRejected(error.message),
            _ => DuoError::Gateway(error),
        }
    }
}
