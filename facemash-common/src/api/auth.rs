//! Host-supplied credential handling
//!
//! The hosting mini-app environment hands the client an opaque init data
//! string. It is forwarded verbatim as `Authorization: tma <initData>`; the
//! backend validates it. The client never inspects or signs it.

use thiserror::Error;

/// Authorization scheme prefix expected by the backend filter
pub const AUTH_SCHEME: &str = "tma";

/// Credential problems detected before a request is sent
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// Credential configured but empty or whitespace only
    #[error("Init data credential is blank")]
    Blank,

    /// Credential contains characters that cannot appear in an HTTP header
    #[error("Init data credential contains control characters")]
    InvalidCharacters,
}

/// Build the Authorization header value for an init data credential
///
/// # Examples
///
/// ```
/// use facemash_common::api::authorization_header;
///
/// let header = authorization_header("auth_date=1&hash=abc").unwrap();
/// assert_eq!(header, "tma auth_date=1&hash=abc");
/// ```
pub fn authorization_header(init_data: &str) -> Result<String, CredentialError> {
    let trimmed = init_data.trim();
    if trimmed.is_empty() {
        return Err(CredentialError::Blank);
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(CredentialError::InvalidCharacters);
    }
    Ok(format!("{} {}", AUTH_SCHEME, trimmed))
}
