//! # Expiry Evaluation
//!
//! Tri-state expiry checks over the `exp` claim. A token without `exp` is
//! [`ExpiryStatus::Unknown`], which callers must not read as valid.

use crate::claims::Claims;
use std::time::{SystemTime, UNIX_EPOCH};

/// Outcome of an expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryStatus {
    /// `now >= exp`.
    Expired,
    /// `now < exp`.
    Valid,
    /// No `exp` claim; validity cannot be determined.
    Unknown,
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

/// Converts an `exp` claim (seconds) to the clock's unit (milliseconds).
pub fn exp_to_millis(exp: i64) -> i64 {
    exp.saturating_mul(1000)
}

/// Checks `claims` against the current time.
pub fn is_expired(claims: &Claims) -> ExpiryStatus {
    is_expired_at(claims, now_millis())
}

/// Checks `claims` against `now_ms`.
pub fn is_expired_at(claims: &Claims, now_ms: i64) -> ExpiryStatus {
    match claims.expiry() {
        Ok(exp) if now_ms >= exp_to_millis(exp) => ExpiryStatus::Expired,
        Ok(_) => ExpiryStatus::Valid,
        Err(e) => {
            tracing::debug!("Expiry unknown: {}", e);
            ExpiryStatus::Unknown
        }
    }
}

/// Whole seconds until `claims` expire; negative once expired.
pub fn seconds_until_expiry(claims: &Claims) -> Option<i64> {
    seconds_until_expiry_at(claims, now_millis())
}

/// Whole seconds between `now_ms` and expiry, rounded down.
pub fn seconds_until_expiry_at(claims: &Claims, now_ms: i64) -> Option<i64> {
    let exp = claims.expiry().ok()?;
    Some(exp_to_millis(exp).saturating_sub(now_ms).div_euclid(1000))
}
