//! Defines the error types that can occur while handling session tokens.
//!
//! These errors never cross the public boundary of [`TokenManager`]: each
//! manager operation logs them and degrades to "no token available". They are
//! returned directly only by the lower-level decoding helpers.
//!
//! [`TokenManager`]: crate::TokenManager

use thiserror::Error;

/// Represents errors that can occur while decoding or refreshing tokens.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    /// The token is not a three-segment token with a JSON object payload.
    #[error("malformed token format")]
    MalformedToken,

    /// An expected claim is absent from the payload.
    #[error("claim missing: {0}")]
    ClaimMissing(&'static str),

    /// The session provider failed to return the current session.
    #[error("session fetch failed: {0}")]
    SessionFetchFailed(String),

    /// The session provider failed to rotate the session.
    #[error("session refresh failed: {0}")]
    RefreshFailed(String),

    /// Configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),
}
