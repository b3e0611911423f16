//! API module for shared backend contract types
//!
//! Contains the response envelope every gateway call produces, the request
//! bodies sent to the backend, and the host credential helpers.
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP client dependencies)
//! - Shared serde types
//!
//! The HTTP transport lives in `facemash-client`.

pub mod auth;
pub mod types;

pub use auth::{authorization_header, CredentialError, AUTH_SCHEME};
pub use types::{ApiEnvelope, VoteRequest};
