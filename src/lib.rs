//! # bearer-session
//!
//! A lightweight session token lifecycle manager for clients that call APIs
//! with bearer tokens issued by an external identity provider.
//!
//! ## Features
//! - **Tolerant Decoding**: reads token claims without ever panicking on malformed input.
//! - **Tri-State Expiry**: distinguishes expired, valid, and unknown expiry.
//! - **Coalesced Refresh**: concurrent callers share a single in-flight refresh.
//! - **Ready Headers**: produces `Authorization` headers, or none when signed out.
//!
//! Signatures are never verified; tokens are trusted structurally and the
//! server remains the authority.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bearer_session::{AuthSession, HttpSessionProvider, ProviderConfig, TokenManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Seed a provider with the session obtained at sign-in
//!     let config = ProviderConfig::new("https://auth.example.com/oauth2/token", "my-client-id");
//!     let provider = HttpSessionProvider::new(
//!         config,
//!         AuthSession {
//!             access_token: Some("eyJ...".to_string()),
//!             id_token: Some("eyJ...".to_string()),
//!             refresh_token: Some("refresh...".to_string()),
//!         },
//!     );
//!
//!     // 2. Build the manager once at the composition root
//!     let manager = TokenManager::get_instance(|| TokenManager::new(Arc::new(provider)));
//!
//!     // 3. Attach headers to outbound requests; empty means unauthenticated
//!     let headers = manager.get_auth_headers().await;
//!     println!("Sending {} auth headers", headers.len());
//! }
//! ```
// Module declarations for the library's internal components.
/// Claim types and identity extraction.
mod claims;
/// Manager and provider configuration.
mod config;
/// Defines error types for the library.
mod error;
/// Tri-state expiry evaluation.
pub mod expiry;
/// Authorization header composition.
mod headers;
/// Caches session material and coordinates refreshes.
mod manager;
/// Provides token payload decoding.
mod parser;
/// OAuth2 refresh-grant session provider.
mod provider;
/// Session material and the provider seam.
mod session;


// Re-exporting key types and functions for a clean public API.
pub use claims::{Claims, Identity};
pub use config::{ManagerConfig, ProviderConfig};
pub use error::AuthError;
pub use expiry::{is_expired, seconds_until_expiry, ExpiryStatus};
pub use headers::auth_headers;
pub use manager::{SessionState, TokenManager};
pub use parser::{
    decode, email_from_token, token_preview, user_id_from_token, username_from_token, TokenParser,
};
pub use provider::HttpSessionProvider;
pub use session::{AuthSession, SessionMaterial, SessionProvider};
