//! HTTPS enforcement for production deployments.
//!
//! Requests that did not arrive over TLS (directly, or at a TLS-terminating
//! proxy that says so through `X-Forwarded-Proto`) are answered with a
//! `307 Temporary Redirect` to the same URL on `https://`.

use std::str::FromStr;

use axum::{
    body::Body,
    extract::State,
    http::{header, uri::Authority, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::error::ApiError;

pub const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Redirect policy state.
#[derive(Debug, Clone, Copy)]
pub struct HttpsRedirect {
    /// The listener itself terminates TLS, so every request is already secure.
    pub tls_listener: bool,
}

impl HttpsRedirect {
    pub fn is_secure<B>(&self, request: &Request<B>) -> bool {
        if self.tls_listener || request.uri().scheme_str() == Some("https") {
            return true;
        }
        request
            .headers()
            .get(X_FORWARDED_PROTO)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
    }
}

/// Build the `https://` location for a plain request. Default ports are dropped.
pub fn https_location<B>(request: &Request<B>) -> Option<String> {
    let authority = match request.uri().authority() {
        Some(a) => a.clone(),
        None => {
            let host = request.headers().get(header::HOST)?.to_str().ok()?;
            Authority::from_str(host).ok()?
        }
    };

    let netloc = match authority.port_u16() {
        None | Some(80) | Some(443) => authority.host().to_string(),
        Some(port) => format!("{}:{}", authority.host(), port),
    };

    let path_and_query = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    Some(format!("https://{}{}", netloc, path_and_query))
}

pub async fn https_redirect_middleware(
    State(policy): State<HttpsRedirect>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if policy.is_secure(&request) {
        return next.run(request).await;
    }

    let Some(location) = https_location(&request) else {
        return ApiError::BadRequest("Missing Host header".to_string()).into_response();
    };

    match HeaderValue::from_str(&location) {
        Ok(value) => {
            tracing::debug!(location = %location, "Redirecting plain HTTP request");
            (StatusCode::TEMPORARY_REDIRECT, [(header::LOCATION, value)]).into_response()
        }
        Err(_) => ApiError::BadRequest("Invalid Host header".to_string()).into_response(),
    }
}
