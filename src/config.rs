//! Manager and provider configuration.
//!
//! Both structs can be built directly or read from `BEARER_SESSION_*`
//! environment variables; `dotenvy` loads a `.env` file first if present.

use crate::error::AuthError;
use std::str::FromStr;
use std::time::Duration;

/// Default HTTP request timeout for the token endpoint.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Token manager configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerConfig {
    /// Refresh tokens this many seconds before they expire. `0` refreshes
    /// only once `now >= exp`.
    pub refresh_leeway_secs: u64,
    /// Present the identity token rather than the access token when both
    /// are available.
    pub prefer_id_token: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            refresh_leeway_secs: 0,
            prefer_id_token: true,
        }
    }
}

impl ManagerConfig {
    /// Reads `BEARER_SESSION_REFRESH_LEEWAY_SECS` and
    /// `BEARER_SESSION_PREFER_ID_TOKEN`, falling back to defaults.
    pub fn from_env() -> Result<Self, AuthError> {
        let defaults = Self::default();
        Ok(Self {
            refresh_leeway_secs: env_or(
                "BEARER_SESSION_REFRESH_LEEWAY_SECS",
                defaults.refresh_leeway_secs,
            )?,
            prefer_id_token: env_or("BEARER_SESSION_PREFER_ID_TOKEN", defaults.prefer_id_token)?,
        })
    }
}

/// Configuration for [`HttpSessionProvider`].
///
/// [`HttpSessionProvider`]: crate::HttpSessionProvider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// OAuth2 token endpoint used for the `refresh_token` grant.
    pub token_url: String,
    /// Public client id sent with the grant.
    pub client_id: String,
    /// Total request timeout.
    pub request_timeout: Duration,
}

impl ProviderConfig {
    pub fn new(token_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            token_url: token_url.into(),
            client_id: client_id.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reads `BEARER_SESSION_TOKEN_URL`, `BEARER_SESSION_CLIENT_ID` and the
    /// optional `BEARER_SESSION_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, AuthError> {
        let token_url = env_required("BEARER_SESSION_TOKEN_URL")?;
        let client_id = env_required("BEARER_SESSION_CLIENT_ID")?;
        let timeout_secs = env_or(
            "BEARER_SESSION_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        )?;

        if !token_url.starts_with("https://") {
            tracing::warn!("Token endpoint should use HTTPS: {}", token_url);
        }

        Ok(Self {
            token_url,
            client_id,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn env_required(key: &str) -> Result<String, AuthError> {
    dotenvy::var(key).map_err(|_| AuthError::Config(format!("{key} must be set")))
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, AuthError> {
    match dotenvy::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AuthError::Config(format!("{key} has an invalid value: {raw}"))),
        Err(_) => Ok(default),
    }
}
