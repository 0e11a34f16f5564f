//! Client-facing error type.
//!
//! Every failure leaves the gateway as `{"detail": "<string>"}` with a status
//! code chosen by the variant. Nothing in here carries upstream text unless the
//! caller already decided (through [`ErrorExposure`](crate::config::ErrorExposure))
//! that it is safe to show.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::portfolio::FieldError;
use crate::security::auth::AuthError;

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Query parameters failed validation (422).
    #[error("{}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    /// No `Authorization` header, or one without both a scheme and a token (403).
    #[error("Not authenticated")]
    MissingCredentials,

    /// `Authorization` header present but not a usable Bearer credential (403).
    #[error("Invalid authentication credentials")]
    MalformedCredentials,

    /// Bearer token rejected (401).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Fixed window exhausted (429).
    #[error("Rate limit exceeded: {limit} per {window_secs} second(s)")]
    RateLimited {
        limit: u32,
        window_secs: u64,
        retry_after_secs: u64,
    },

    /// Plain HTTP request that must be upgraded but carries no usable Host (400).
    #[error("{0}")]
    BadRequest(String),

    /// Upstream failure; the message is already sanitized or deliberately verbatim (500).
    #[error("{0}")]
    Upstream(String),

    /// No route for the path (404).
    #[error("Not Found")]
    NotFound,

    /// Route exists but not for this method (405).
    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Whole-request deadline exceeded (408).
    #[error("Request timeout")]
    RequestTimeout,

    /// Request body over the configured limit (413).
    #[error("Request body too large")]
    PayloadTooLarge,
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MissingCredentials | ApiError::MalformedCredentials => StatusCode::FORBIDDEN,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            detail: self.to_string(),
        };
        let mut response = (status, Json(body)).into_response();

        match &self {
            ApiError::Auth(_) => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            ApiError::RateLimited {
                retry_after_secs, ..
            } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            _ => {}
        }

        response
    }
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Give the plain 408/413 responses from the timeout and body-limit layers
/// the usual `{"detail": ...}` shape. JSON responses are left alone.
pub async fn json_error_bodies(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .is_some_and(|ct| ct.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }
    let replacement = match response.status() {
        StatusCode::REQUEST_TIMEOUT => ApiError::RequestTimeout,
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge,
        _ => return response,
    };

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    let (rendered, body) = replacement.into_response().into_parts();
    for (name, value) in rendered.headers.iter() {
        parts.headers.insert(name.clone(), value.clone());
    }
    Response::from_parts(parts, body)
}
