//! # Token Claims
//!
//! Typed view over a decoded token payload. The recognized claims get their
//! own fields; everything else lands in [`Claims::extra`] untouched.
//!
//! Identity is never read off a single field directly. The accessors below
//! walk a fixed fallback chain so that access tokens (no profile claims) and
//! identity tokens (profile claims, provider alias) resolve the same way.
//!
//! A recognized claim carrying an unexpected JSON type is read as absent
//! rather than failing the whole payload. Time claims accept any JSON number
//! and are floored to whole seconds.

use crate::error::AuthError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Claims decoded from a bearer token's payload segment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sub: Option<String>,
    /// Plain username claim.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub username: Option<String>,
    /// Provider-specific username alias.
    #[serde(
        rename = "cognito:username",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_username: Option<String>,
    /// Email address.
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    /// Expiry, seconds since epoch.
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub exp: Option<i64>,
    /// Issued at, seconds since epoch.
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub iat: Option<i64>,
    /// Claims this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Normalized identity fields resolved from [`Claims`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl Claims {
    /// User id: `sub`, then the provider alias, then `username`.
    pub fn user_id(&self) -> Option<&str> {
        present(&self.sub)
            .or_else(|| present(&self.provider_username))
            .or_else(|| present(&self.username))
    }

    /// Username: the provider alias, then `username`, then `email`.
    pub fn username(&self) -> Option<&str> {
        present(&self.provider_username)
            .or_else(|| present(&self.username))
            .or_else(|| present(&self.email))
    }

    /// Email address, if present.
    pub fn email(&self) -> Option<&str> {
        present(&self.email)
    }

    /// Resolves all identity fields at once.
    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.user_id().map(str::to_owned),
            username: self.username().map(str::to_owned),
            email: self.email().map(str::to_owned),
        }
    }

    /// The `exp` claim, or [`AuthError::ClaimMissing`].
    pub fn expiry(&self) -> Result<i64, AuthError> {
        self.exp.ok_or(AuthError::ClaimMissing("exp"))
    }

    /// Looks up a claim this crate does not model.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

// Empty strings resolve the same as a missing claim.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// NumericDate may be fractional; floor to whole seconds.
fn numeric_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|secs| secs.is_finite())
                .map(|secs| secs.floor() as i64)
        }),
        _ => None,
    })
}
