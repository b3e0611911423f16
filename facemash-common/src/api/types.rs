//! Shared API request/response types

use serde::{Deserialize, Serialize};

use crate::PersonId;

// ========================================
// Response Envelope
// ========================================

/// Uniform result shape of every gateway call
///
/// Successes carry `data`, failures carry `message`. Serialized as
/// `{"success": true, "data": ...}` or `{"success": false, "message": "..."}`.
///
/// # Examples
///
/// ```
/// use facemash_common::api::ApiEnvelope;
///
/// let ok = ApiEnvelope::ok(42);
/// assert!(ok.success);
/// assert_eq!(ok.data, Some(42));
///
/// let failed: ApiEnvelope<i32> = ApiEnvelope::failure("Network error: timed out");
/// assert!(!failed.success);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Successful envelope
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    /// Failed envelope
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }

    /// Convert back into a `Result`, using `on_missing` when a success carries no data
    pub fn into_result(self, on_missing: impl FnOnce() -> String) -> Result<T, String> {
        match (self.success, self.data) {
            (true, Some(data)) => Ok(data),
            (true, None) => Err(on_missing()),
            (false, _) => Err(self
                .message
                .unwrap_or_else(|| "Request failed".to_string())),
        }
    }
}

impl<T, E: std::fmt::Display> From<Result<T, E>> for ApiEnvelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

// ========================================
// Request Bodies
// ========================================

/// Body of `POST /persons/duo/vote`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub winner_id: PersonId,
    pub loser_id: PersonId,
}

// ========================================
// Tests
// ========================================
