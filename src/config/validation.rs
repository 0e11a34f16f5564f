//! Configuration validation.
//!
//! Semantic checks run after the environment has been parsed. All problems
//! are collected and returned together so an operator can fix them in one go.

use axum::http::HeaderValue;

use crate::config::schema::{DeploymentProfile, ErrorExposure, GatewayConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.profile.is_hardened() {
        match config.auth.api_key.as_deref() {
            None => errors.push(ValidationError::new(
                "API_KEY",
                "required by the hardened profile",
            )),
            Some(PLACEHOLDER_API_KEY) => errors.push(ValidationError::new(
                "API_KEY",
                "still set to the placeholder value",
            )),
            Some(_) => {}
        }

        for origin in &config.cors.allowed_origins {
            if origin == "*" {
                errors.push(ValidationError::new(
                    "ALLOWED_ORIGINS",
                    "wildcard origin cannot be combined with credentials",
                ));
            } else if HeaderValue::from_str(origin).is_err() || url::Url::parse(origin).is_err() {
                errors.push(ValidationError::new(
                    "ALLOWED_ORIGINS",
                    format!("invalid origin {:?}", origin),
                ));
            }
        }

        if config.rate_limit.requests == 0 {
            errors.push(ValidationError::new("RATE_LIMIT_REQUESTS", "must be greater than 0"));
        }
        if config.rate_limit.window_secs == 0 {
            errors.push(ValidationError::new("RATE_LIMIT_WINDOW_SECS", "must be greater than 0"));
        }
    }

    if config.profile == DeploymentProfile::Local && !config.server.host.is_loopback() {
        errors.push(ValidationError::new(
            "HOST",
            format!("local profile must bind a loopback address, got {}", config.server.host),
        ));
    }

    if config.environment.is_production()
        && config.security.error_exposure == ErrorExposure::Verbatim
    {
        errors.push(ValidationError::new(
            "EXPOSE_UPSTREAM_ERRORS",
            "verbatim upstream errors are not allowed in production",
        ));
    }

    match url::Url::parse(&config.upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "IBKR_BASE_URL",
            format!("unsupported scheme {:?}", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("IBKR_BASE_URL", e.to_string())),
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::new("IBKR_TIMEOUT_SECS", "must be greater than 0"));
    }
    if config.security.request_timeout_secs == 0 {
        errors.push(ValidationError::new("REQUEST_TIMEOUT_SECS", "must be greater than 0"));
    }

    if config.server.tls_cert_path.is_some() != config.server.tls_key_path.is_some() {
        errors.push(ValidationError::new(
            "SSL_CERTFILE",
            "SSL_CERTFILE and SSL_KEYFILE must be set together",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
