//! HTTP Basic authentication gate
//!
//! Runs in front of every route. Requests must carry
//! `Authorization: Basic base64(username:password)` matching the configured
//! pair; anything else gets a 401 with a `WWW-Authenticate` challenge.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};

use crate::config::AuthConfig;
use crate::AppState;

/// Credentials decoded from an `Authorization: Basic` header
#[derive(Debug, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Decode Basic credentials from request headers
pub fn parse_basic(headers: &HeaderMap) -> Option<BasicCredentials> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

impl AuthConfig {
    /// Check supplied credentials against the configured pair
    pub fn accepts(&self, credentials: &BasicCredentials) -> bool {
        // Non-short-circuiting: both halves are always compared
        let user_ok = constant_time_eq(credentials.username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(credentials.password.as_bytes(), self.password.as_bytes());
        user_ok & pass_ok
    }
}

/// Middleware rejecting requests without valid Basic credentials
pub async fn require_basic_auth(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    match parse_basic(request.headers()) {
        Some(credentials) if state.auth.accepts(&credentials) => next.run(request).await,
        Some(credentials) => {
            tracing::debug!(
                "Rejected credentials for user {:?} on {} {}",
                credentials.username,
                request.method(),
                request.uri().path()
            );
            unauthorized(&state.auth.realm)
        }
        None => {
            tracing::debug!(
                "Missing or malformed Basic credentials on {} {}",
                request.method(),
                request.uri().path()
            );
            unauthorized(&state.auth.realm)
        }
    }
}

fn unauthorized(realm: &str) -> Response {
    let challenge = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm))
        .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, challenge)],
        "Unauthorized",
    )
        .into_response()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
