//! Upstream portfolio provider seam.

use async_trait::async_trait;

use crate::portfolio::types::{Portfolio, PortfolioRequest};

/// Longest upstream body kept in an error.
const MAX_ERROR_BODY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("connection to upstream failed: {0}")]
    Connection(String),

    #[error("upstream request timeout: {0}")]
    Timeout(String),

    #[error("upstream authentication rejected (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("upstream permission denied: forbidden (HTTP {status})")]
    Forbidden { status: u16 },

    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid upstream payload: {0}")]
    Decode(String),

    #[error("no accounts available upstream")]
    NoAccounts,

    #[error("upstream client setup failed: {0}")]
    Client(String),
}

impl UpstreamError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Connection(_) => "connection",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::Unauthorized { .. } => "unauthorized",
            UpstreamError::Forbidden { .. } => "forbidden",
            UpstreamError::Status { .. } => "status",
            UpstreamError::Decode(_) => "decode",
            UpstreamError::NoAccounts => "no_accounts",
            UpstreamError::Client(_) => "client",
        }
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 => UpstreamError::Unauthorized { status },
            403 => UpstreamError::Forbidden { status },
            _ => UpstreamError::Status {
                status,
                body: truncate(body, MAX_ERROR_BODY),
            },
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Timeout(e.to_string())
        } else if e.is_decode() {
            UpstreamError::Decode(e.to_string())
        } else if e.is_builder() {
            UpstreamError::Client(e.to_string())
        } else {
            UpstreamError::Connection(e.to_string())
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Source of portfolio data.
#[async_trait]
pub trait PortfolioProvider: Send + Sync {
    async fn fetch_portfolio(&self, request: &PortfolioRequest) -> Result<Portfolio, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::{classify, SafeMessage};

    #[test]
    fn status_classification() {
        assert!(matches!(
            UpstreamError::from_status(401, ""),
            UpstreamError::Unauthorized { status: 401 }
        ));
        assert!(matches!(
            UpstreamError::from_status(403, ""),
            UpstreamError::Forbidden { status: 403 }
        ));
        assert!(matches!(
            UpstreamError::from_status(503, "down"),
            UpstreamError::Status { status: 503, .. }
        ));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(1000);
        match UpstreamError::from_status(500, &body) {
            UpstreamError::Status { body, .. } => assert_eq!(body.len(), MAX_ERROR_BODY + 3),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn messages_sanitize_to_matching_category() {
        assert_eq!(
            classify(&UpstreamError::Connection("refused".into()).to_string()),
            SafeMessage::ServiceUnavailable
        );
        assert_eq!(
            classify(&UpstreamError::Timeout("30s".into()).to_string()),
            SafeMessage::RequestTimeout
        );
        assert_eq!(
            classify(&UpstreamError::Unauthorized { status: 401 }.to_string()),
            SafeMessage::AuthenticationFailed
        );
        assert_eq!(
            classify(&UpstreamError::Forbidden { status: 403 }.to_string()),
            SafeMessage::AccessDenied
        );
        assert_eq!(
            classify(&UpstreamError::NoAccounts.to_string()),
            SafeMessage::Generic
        );
    }
}
