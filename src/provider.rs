//! # HTTP Session Provider
//!
//! A [`SessionProvider`] backed by an OAuth2 token endpoint.
//!
//! ## Behavior
//! - **In-Memory Session**: the current session is held locally and returned
//!   as-is for non-forcing fetches
//! - **Refresh Grant**: forced fetches exchange the refresh token for a new
//!   session via `grant_type=refresh_token`
//! - **Rotation Aware**: a refresh token in the response replaces the stored
//!   one; otherwise the stored one is kept

use crate::config::ProviderConfig;
use crate::session::{AuthSession, SessionProvider};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::LazyLock;
use tokio::sync::RwLock;

/// Global HTTP client instance with a connection pool.
static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .connect_timeout(std::time::Duration::from_secs(5))
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(std::time::Duration::from_secs(30))
        .build()
        .expect("Failed to create HTTP client")
});

/// Response body of a successful `refresh_token` grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Session provider that refreshes against an OAuth2 token endpoint.
#[derive(Debug)]
pub struct HttpSessionProvider {
    config: ProviderConfig,
    session: RwLock<AuthSession>,
}

impl HttpSessionProvider {
    /// Creates a provider seeded with an existing session, typically the one
    /// obtained at sign-in.
    pub fn new(config: ProviderConfig, session: AuthSession) -> Self {
        Self {
            config,
            session: RwLock::new(session),
        }
    }

    /// Replaces the stored session, e.g. after a fresh sign-in.
    pub async fn set_session(&self, session: AuthSession) {
        *self.session.write().await = session;
    }

    /// Forgets the stored session.
    pub async fn sign_out(&self) {
        *self.session.write().await = AuthSession::default();
    }

    /// Copy of the stored session.
    pub async fn session(&self) -> AuthSession {
        self.session.read().await.clone()
    }

    async fn refresh(&self) -> anyhow::Result<AuthSession> {
        let refresh_token = self
            .session
            .read()
            .await
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow!("no refresh token available"))?;

        tracing::info!("Refreshing session via: {}", self.config.token_url);

        let response = HTTP_CLIENT
            .post(&self.config.token_url)
            .timeout(self.config.request_timeout)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await
            .context("token endpoint request failed")?;

        let status = response.status();
        if !status.is_success() {
            bail!("token endpoint returned status: {status}");
        }

        let body: TokenResponse = response
            .json()
            .await
            .context("failed to parse token endpoint response")?;

        let refreshed = AuthSession {
            access_token: Some(body.access_token),
            id_token: body.id_token,
            refresh_token: body.refresh_token.or(Some(refresh_token)),
        };

        *self.session.write().await = refreshed.clone();
        tracing::info!("Session refreshed");
        Ok(refreshed)
    }
}

#[async_trait]
impl SessionProvider for HttpSessionProvider {
    async fn fetch_session(&self, force_refresh: bool) -> anyhow::Result<AuthSession> {
        if force_refresh {
            return self.refresh().await;
        }
        Ok(self.session().await)
    }
}
