//! # Token Payload Decoding
//!
//! Tolerant decoder for bearer tokens issued by the identity provider.
//!
//! ## Behavior
//! - **Structure Only**: splits `header.payload.signature` and decodes the
//!   payload; the signature is never checked
//! - **Never Panics**: every failure becomes [`AuthError::MalformedToken`]
//! - **Safe Logging**: failures log at most a 20-character token preview

use crate::claims::Claims;
use crate::error::AuthError;
use base64::{engine::general_purpose, Engine as _};

/// Number of leading characters logged when a token fails to decode.
pub const TOKEN_PREVIEW_LEN: usize = 20;

/// Token Parser.
///
/// Decodes the claims carried in a token's payload segment.
pub struct TokenParser;

impl TokenParser {
    /// Decodes the payload segment of `token` into [`Claims`].
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token string, without the `Bearer ` prefix
    pub fn decode(token: &str) -> Result<Claims, AuthError> {
        if token.trim().is_empty() {
            tracing::warn!("Token decode failed: empty token");
            return Err(AuthError::MalformedToken);
        }

        // header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            tracing::warn!(
                "Token decode failed: expected 3 segments, got {} (token: {})",
                parts.len(),
                token_preview(token)
            );
            return Err(AuthError::MalformedToken);
        }

        // Some issuers pad base64url segments; strip it before decoding.
        let payload = parts[1].trim_end_matches('=');
        let payload_bytes = general_purpose::URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|e| {
                tracing::warn!(
                    "Token decode failed: invalid payload encoding: {} (token: {})",
                    e,
                    token_preview(token)
                );
                AuthError::MalformedToken
            })?;

        let claims: Claims = serde_json::from_slice(&payload_bytes).map_err(|e| {
            tracing::warn!(
                "Token decode failed: invalid payload JSON: {} (token: {})",
                e,
                token_preview(token)
            );
            AuthError::MalformedToken
        })?;

        tracing::debug!(
            "Decoded token claims for subject: {:?}",
            claims.sub.as_deref()
        );

        Ok(claims)
    }
}

/// Decodes `token` and returns its claims.
pub fn decode(token: &str) -> Result<Claims, AuthError> {
    TokenParser::decode(token)
}

/// User id carried by `token`, or `None` if it cannot be decoded or resolved.
pub fn user_id_from_token(token: &str) -> Option<String> {
    decode(token).ok()?.user_id().map(str::to_owned)
}

/// Username carried by `token`, or `None`.
pub fn username_from_token(token: &str) -> Option<String> {
    decode(token).ok()?.username().map(str::to_owned)
}

/// Email carried by `token`, or `None`.
pub fn email_from_token(token: &str) -> Option<String> {
    decode(token).ok()?.email().map(str::to_owned)
}

/// Leading characters of `token` that are safe to log.
pub fn token_preview(token: &str) -> String {
    let mut preview: String = token.chars().take(TOKEN_PREVIEW_LEN).collect();
    if token.chars().count() > TOKEN_PREVIEW_LEN {
        preview.push_str("...");
    }
    preview
}

// Tests live in the unified tests module.
// See: src/tests/parser_tests.rs
