//! Error message sanitization.
//!
//! Upstream failures can carry hostnames, account numbers or credentials in
//! their text. The client gets one of five fixed messages instead; the
//! original only goes to the server log.
//!
//! Matching is a case-insensitive substring check in a fixed order, first
//! match wins.

use std::fmt;

/// One of the canned client-safe messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeMessage {
    ServiceUnavailable,
    AuthenticationFailed,
    AccessDenied,
    RequestTimeout,
    Generic,
}

impl SafeMessage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            SafeMessage::ServiceUnavailable => "Service temporarily unavailable",
            SafeMessage::AuthenticationFailed => "Authentication failed",
            SafeMessage::AccessDenied => "Access denied",
            SafeMessage::RequestTimeout => "Request timeout",
            SafeMessage::Generic => "An error occurred while processing your request",
        }
    }
}

impl fmt::Display for SafeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const RULES: &[(&[&str], SafeMessage)] = &[
    (&["connection", "network"], SafeMessage::ServiceUnavailable),
    (&["authentication", "auth"], SafeMessage::AuthenticationFailed),
    (&["permission", "forbidden"], SafeMessage::AccessDenied),
    (&["timeout"], SafeMessage::RequestTimeout),
];

/// Map an error description to its safe message. Pure.
pub fn classify(description: &str) -> SafeMessage {
    let lowered = description.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, message)| *message)
        .unwrap_or(SafeMessage::Generic)
}

/// Log the full error server-side and return the safe message for the client.
pub fn sanitize(error: &dyn fmt::Display) -> SafeMessage {
    let description = error.to_string();
    tracing::error!(error = %description, "Internal error");
    classify(&description)
}
