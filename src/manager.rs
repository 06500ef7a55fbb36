//! # Token Manager
//!
//! Holds the last known session material and hands out tokens that are valid
//! right now, refreshing through the [`SessionProvider`] when they are not.
//!
//! ## Guarantees
//! - **Never Fails Loudly**: every provider or decoding failure is logged and
//!   surfaced as `None` / empty headers
//! - **Single Refresh**: concurrent callers that need a refresh share one
//!   in-flight refresh and all observe its outcome
//! - **Copies Out**: callers receive owned strings, never references into
//!   the cache
//!
//! ## Lifecycle
//! `Empty → Fetching → Valid → (Expiring) → Refreshing → Valid | Empty`

use crate::claims::{Claims, Identity};
use crate::config::ManagerConfig;
use crate::error::AuthError;
use crate::expiry::{self, now_millis, ExpiryStatus};
use crate::headers::auth_headers;
use crate::parser::{token_preview, TokenParser};
use crate::session::{SessionMaterial, SessionProvider};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::{Mutex, RwLock};

/// Process-wide instance, set up once at the composition root.
static INSTANCE: OnceLock<Arc<TokenManager>> = OnceLock::new();

/// Observable state of the cached session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing cached.
    Empty,
    /// Cached token is valid beyond the refresh leeway.
    Valid,
    /// Cached token is valid but within the refresh leeway.
    Expiring,
    /// Cached token has expired.
    Expired,
    /// Cached token carries no usable `exp`.
    Unknown,
    /// A refresh is in flight.
    Refreshing,
}

/// Outcome of the most recent refresh, shared with callers that waited on it.
#[derive(Debug, Default)]
struct RefreshSlot {
    last_outcome: Option<SessionMaterial>,
}

/// Session token lifecycle manager.
pub struct TokenManager {
    provider: Arc<dyn SessionProvider>,
    config: ManagerConfig,
    /// The cached session material, at most one.
    cache: RwLock<Option<SessionMaterial>>,
    /// Serializes refreshes against the provider.
    refresh_slot: Mutex<RefreshSlot>,
    /// Number of completed refreshes. Only changes under the cache write lock.
    refresh_generation: AtomicU64,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("config", &self.config)
            .field("refresh_generation", &self.refresh_generation)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Creates a manager with default configuration.
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        Self::with_config(provider, ManagerConfig::default())
    }

    pub fn with_config(provider: Arc<dyn SessionProvider>, config: ManagerConfig) -> Self {
        Self {
            provider,
            config,
            cache: RwLock::new(None),
            refresh_slot: Mutex::new(RefreshSlot::default()),
            refresh_generation: AtomicU64::new(0),
        }
    }

    /// Returns the process-wide manager, building it with `init` on first
    /// access. Later calls ignore `init`.
    ///
    /// Meant for the application's composition root; everything else should
    /// receive the `Arc` it returns.
    pub fn get_instance(init: impl FnOnce() -> TokenManager) -> Arc<TokenManager> {
        INSTANCE.get_or_init(|| Arc::new(init())).clone()
    }

    /// Returns a token that is not known to be expired, refreshing if needed.
    pub async fn get_valid_token(&self) -> Option<String> {
        let observed = self.refresh_generation.load(Ordering::Acquire);

        let session = match self.provider.fetch_session(false).await {
            Ok(session) => session,
            Err(e) => {
                let err = AuthError::SessionFetchFailed(format!("{e:#}"));
                tracing::warn!("Could not obtain session: {}", err);
                return None;
            }
        };

        let Some(material) = SessionMaterial::from_session(session, self.config.prefer_id_token)
        else {
            tracing::debug!("No token material in current session");
            self.store_if_current(observed, None).await;
            return None;
        };

        let token = material.token.clone();
        let claims = match TokenParser::decode(&token) {
            Ok(claims) => claims,
            Err(_) => {
                tracing::warn!("Current token is malformed, refreshing: {}", token_preview(&token));
                self.store_if_current(observed, None).await;
                return self.refresh_coalesced(observed, Some(&token)).await;
            }
        };
        self.store_if_current(observed, Some(material)).await;

        let now = now_millis();
        match expiry::is_expired_at(&claims, now) {
            ExpiryStatus::Expired => {
                tracing::info!("Token expired, refreshing: {}", token_preview(&token));
                self.refresh_coalesced(observed, Some(&token)).await
            }
            ExpiryStatus::Valid if self.within_leeway(&claims, now) => {
                tracing::info!("Token expiring soon, refreshing: {}", token_preview(&token));
                self.refresh_coalesced(observed, Some(&token)).await
            }
            ExpiryStatus::Valid => Some(token),
            ExpiryStatus::Unknown => {
                tracing::debug!("Token has no expiry, using as-is");
                Some(token)
            }
        }
    }

    /// Forces the provider to rotate the session and returns the new token.
    pub async fn refresh_token(&self) -> Option<String> {
        let observed = self.refresh_generation.load(Ordering::Acquire);
        self.refresh_coalesced(observed, None).await
    }

    /// Headers for an authenticated request; empty when no token is available.
    pub async fn get_auth_headers(&self) -> HashMap<String, String> {
        let token = self.get_valid_token().await;
        auth_headers(token.as_deref())
    }

    /// Discards the cached session material.
    pub async fn clear_cache(&self) {
        if self.cache.write().await.take().is_some() {
            tracing::debug!("Token cache cleared");
        }
    }

    /// Identity resolved from the currently valid token.
    pub async fn current_identity(&self) -> Option<Identity> {
        let token = self.get_valid_token().await?;
        TokenParser::decode(&token).ok().map(|claims| claims.identity())
    }

    /// State of the cached material at this moment.
    pub async fn state(&self) -> SessionState {
        if self.refresh_slot.try_lock().is_err() {
            return SessionState::Refreshing;
        }

        let cache = self.cache.read().await;
        let Some(material) = cache.as_ref() else {
            return SessionState::Empty;
        };

        match material.remaining_millis(now_millis()) {
            None => SessionState::Unknown,
            Some(left) if left <= 0 => SessionState::Expired,
            Some(left) if left < self.leeway_millis() => SessionState::Expiring,
            Some(_) => SessionState::Valid,
        }
    }

    /// Runs one refresh, or joins the outcome of one that finished while
    /// this caller waited for the slot.
    ///
    /// `observed` is the refresh generation seen when the caller started.
    /// `stale` is the token that prompted the refresh, if any.
    async fn refresh_coalesced(&self, observed: u64, stale: Option<&str>) -> Option<String> {
        let mut slot = self.refresh_slot.lock().await;

        if self.refresh_generation.load(Ordering::Acquire) != observed {
            let now = now_millis();
            match &slot.last_outcome {
                None => {
                    tracing::debug!("Joined failed concurrent refresh");
                    return None;
                }
                Some(material) if !is_hard_expired(material, now) => {
                    tracing::debug!("Joined outcome of concurrent refresh");
                    return Some(material.token.clone());
                }
                Some(material) => tracing::debug!(
                    "Concurrent refresh yielded an expired token, refreshing again: {}",
                    token_preview(&material.token)
                ),
            }
        }

        // Double-check in case the cache was updated while waiting for the lock.
        if let Some(stale) = stale {
            if let Some(token) = self.usable_cached_token(stale).await {
                tracing::debug!("Token cache was refreshed while waiting for lock");
                return Some(token);
            }
        }

        let material = self.refresh_from_provider().await;
        self.publish_refresh(&mut slot, material).await
    }

    async fn refresh_from_provider(&self) -> Option<SessionMaterial> {
        let session = match self.provider.fetch_session(true).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("{}", AuthError::RefreshFailed(format!("{e:#}")));
                return None;
            }
        };

        let Some(material) = SessionMaterial::from_session(session, self.config.prefer_id_token)
        else {
            tracing::error!(
                "{}",
                AuthError::RefreshFailed("refreshed session carries no token".to_string())
            );
            return None;
        };

        if TokenParser::decode(&material.token).is_err() {
            tracing::error!(
                "{}: {}",
                AuthError::RefreshFailed("refreshed token is malformed".to_string()),
                token_preview(&material.token)
            );
            return None;
        }

        tracing::info!(
            "Token refreshed: {} (expires at: {:?})",
            token_preview(&material.token),
            material.expires_at
        );
        Some(material)
    }

    /// Stores a refresh outcome and advances the generation in one step, so
    /// no caller can observe the new generation alongside the old cache.
    async fn publish_refresh(
        &self,
        slot: &mut RefreshSlot,
        material: Option<SessionMaterial>,
    ) -> Option<String> {
        let token = material.as_ref().map(|m| m.token.clone());
        let mut cache = self.cache.write().await;
        *cache = material.clone();
        slot.last_outcome = material;
        self.refresh_generation.fetch_add(1, Ordering::AcqRel);
        token
    }

    /// Replaces the cache unless a refresh was published since `observed`.
    async fn store_if_current(&self, observed: u64, material: Option<SessionMaterial>) {
        let mut cache = self.cache.write().await;
        if self.refresh_generation.load(Ordering::Acquire) == observed {
            *cache = material;
        }
    }

    /// Cached token if it differs from `stale` and needs no refresh.
    async fn usable_cached_token(&self, stale: &str) -> Option<String> {
        let cache = self.cache.read().await;
        let material = cache.as_ref().filter(|m| m.token != stale)?;
        match material.remaining_millis(now_millis()) {
            Some(left) if left <= 0 || left < self.leeway_millis() => None,
            _ => Some(material.token.clone()),
        }
    }

    fn within_leeway(&self, claims: &Claims, now_ms: i64) -> bool {
        self.config.refresh_leeway_secs > 0
            && expiry::seconds_until_expiry_at(claims, now_ms)
                .is_some_and(|left| left < self.config.refresh_leeway_secs as i64)
    }

    fn leeway_millis(&self) -> i64 {
        (self.config.refresh_leeway_secs as i64).saturating_mul(1000)
    }
}

fn is_hard_expired(material: &SessionMaterial, now_ms: i64) -> bool {
    material.remaining_millis(now_ms).is_some_and(|left| left <= 0)
}
