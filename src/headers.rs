//! Authorization header composition.

use std::collections::HashMap;

pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Builds request headers for `token`.
///
/// No token yields an empty map, which callers treat as unauthenticated.
pub fn auth_headers(token: Option<&str>) -> HashMap<String, String> {
    match token {
        Some(token) => HashMap::from([
            (AUTHORIZATION.to_string(), format!("Bearer {token}")),
            (CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()),
        ]),
        None => HashMap::new(),
    }
}
