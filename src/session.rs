//! Session material and the identity provider seam.

use crate::expiry::exp_to_millis;
use crate::parser::TokenParser;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tokens returned by the identity provider for the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Access token, authorizes API scope.
    pub access_token: Option<String>,
    /// Identity token, carries profile claims.
    pub id_token: Option<String>,
    /// Refresh token, used by the provider to rotate the session.
    pub refresh_token: Option<String>,
}

impl AuthSession {
    /// Picks the token to present as the bearer credential.
    ///
    /// With `prefer_id_token` the identity token wins when present and
    /// non-empty; the other token is the fallback either way.
    pub fn select_token(&self, prefer_id_token: bool) -> Option<&str> {
        let id = self.id_token.as_deref().filter(|t| !t.is_empty());
        let access = self.access_token.as_deref().filter(|t| !t.is_empty());
        if prefer_id_token {
            id.or(access)
        } else {
            access.or(id)
        }
    }
}

/// Identity provider client consumed by [`TokenManager`].
///
/// Implementations own persistence of the session. Errors are opaque to the
/// manager and only logged.
///
/// [`TokenManager`]: crate::TokenManager
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Returns the current session; with `force_refresh` the provider must
    /// rotate it against the identity provider first.
    async fn fetch_session(&self, force_refresh: bool) -> anyhow::Result<AuthSession>;
}

/// The manager's snapshot of a fetched session.
///
/// Replaced wholesale on every fetch or refresh, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMaterial {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    /// The chosen bearer token.
    pub token: String,
    /// Expiry of `token` in milliseconds since epoch, when it carries `exp`.
    pub expires_at: Option<i64>,
}

impl SessionMaterial {
    /// Builds material from a provider session, or `None` if it carries no
    /// usable token.
    pub fn from_session(session: AuthSession, prefer_id_token: bool) -> Option<Self> {
        let token = session.select_token(prefer_id_token)?.to_string();
        let expires_at = TokenParser::decode(&token)
            .ok()
            .and_then(|claims| claims.exp)
            .map(exp_to_millis);

        Some(Self {
            access_token: session.access_token,
            id_token: session.id_token,
            refresh_token: session.refresh_token,
            token,
            expires_at,
        })
    }

    /// Milliseconds left before expiry at `now_ms`, if known.
    pub fn remaining_millis(&self, now_ms: i64) -> Option<i64> {
        self.expires_at.map(|at| at.saturating_sub(now_ms))
    }
}
