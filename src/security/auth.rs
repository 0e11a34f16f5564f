//! Bearer token authentication.
//!
//! A single shared secret, loaded once at start-up. The middleware pulls the
//! token out of `Authorization: Bearer <token>`, the [`Authenticator`] compares
//! it, and the verified identity rides along in the request extensions.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::Response,
};

use crate::config::PLACEHOLDER_API_KEY;
use crate::http::error::ApiError;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// Token did not match the configured secret.
    #[error("Invalid API key")]
    InvalidToken,

    /// No usable secret configured. Reported to the client as a plain
    /// authentication failure so configuration state never leaks.
    #[error("Authentication failed")]
    NotConfigured,
}

/// Caller identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    hint: String,
}

impl VerifiedToken {
    /// Masked form of the key, safe for logs.
    pub fn hint(&self) -> &str {
        &self.hint
    }
}

/// Validates bearer tokens against the configured secret.
#[derive(Clone)]
pub struct Authenticator {
    secret: Option<Arc<str>>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("configured", &self.secret.is_some())
            .finish()
    }
}

impl Authenticator {
    /// Empty and placeholder secrets are treated as "not configured".
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret
            .filter(|s| !s.is_empty() && s != PLACEHOLDER_API_KEY)
            .map(Arc::from);
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, token: &str) -> Result<VerifiedToken, AuthError> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::error!("API key not configured; rejecting authenticated request");
            return Err(AuthError::NotConfigured);
        };

        if constant_time_eq(secret.as_bytes(), token.as_bytes()) {
            Ok(VerifiedToken {
                hint: mask(token),
            })
        } else {
            Err(AuthError::InvalidToken)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn mask(token: &str) -> String {
    let tail: String = token
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

/// Pull the token out of an `Authorization` header value.
///
/// Splits on the first space only and takes the token as-is, so stray
/// whitespace becomes part of the token. A missing scheme or token counts as
/// no credentials at all; the scheme match is case-insensitive.
pub fn parse_bearer(value: &str) -> Result<&str, ApiError> {
    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));
    if scheme.is_empty() || token.is_empty() {
        return Err(ApiError::MissingCredentials);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::MalformedCredentials);
    }
    Ok(token)
}

/// Route middleware requiring a valid bearer token.
pub async fn require_bearer(
    State(auth): State<Authenticator>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| ApiError::MalformedCredentials));

    let token = match header_value {
        None => Err(ApiError::MissingCredentials),
        Some(value) => value.and_then(parse_bearer),
    };
    let token = match token {
        Ok(token) => token,
        Err(e) => {
            metrics::record_auth_failure(match e {
                ApiError::MissingCredentials => "missing",
                _ => "malformed",
            });
            return Err(e);
        }
    };

    match auth.verify(token) {
        Ok(verified) => {
            request.extensions_mut().insert(verified);
            Ok(next.run(request).await)
        }
        Err(e) => {
            tracing::warn!(reason = ?e, "Bearer token rejected");
            metrics::record_auth_failure(match e {
                AuthError::InvalidToken => "invalid",
                AuthError::NotConfigured => "not_configured",
            });
            Err(e.into())
        }
    }
}
