//! Configuration loading from the process environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::schema::{
    DeploymentProfile, Environment, ErrorExposure, GatewayConfig, ServerConfig, UpstreamConfig,
};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load `.env` (or the given file) into the process environment.
///
/// A missing default `.env` is fine; a missing explicit file is not.
pub fn load_env_file(path: Option<&Path>) -> Result<(), ConfigError> {
    match path {
        Some(p) => dotenvy::from_path(p)
            .map(|_| ())
            .map_err(|source| ConfigError::EnvFile {
                path: p.to_path_buf(),
                source,
            }),
        None => {
            if let Ok(p) = dotenvy::dotenv() {
                tracing::debug!(path = %p.display(), "Loaded .env file");
            }
            Ok(())
        }
    }
}

impl GatewayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup.
    ///
    /// Only type coercion happens here; call [`validate_config`] (or use
    /// [`load_config`]) for semantic checks.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let profile = match get("GATEWAY_PROFILE") {
            Some(raw) => DeploymentProfile::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "GATEWAY_PROFILE",
                value: raw.clone(),
                reason: "expected bare, local or hardened".to_string(),
            })?,
            None => DeploymentProfile::default(),
        };

        let mut config = GatewayConfig::for_profile(profile);

        if let Some(raw) = get("ENVIRONMENT") {
            config.environment =
                Environment::parse(&raw).ok_or_else(|| ConfigError::InvalidValue {
                    key: "ENVIRONMENT",
                    value: raw.clone(),
                    reason: "expected development or production".to_string(),
                })?;
        }

        let server_defaults = ServerConfig::default();
        config.server = ServerConfig {
            host: parse_or("HOST", get("HOST"), server_defaults.host)?,
            port: parse_or("PORT", get("PORT"), server_defaults.port)?,
            tls_key_path: get("SSL_KEYFILE").map(PathBuf::from),
            tls_cert_path: get("SSL_CERTFILE").map(PathBuf::from),
        };

        let upstream_defaults = UpstreamConfig::default();
        let upstream_host = get("IBKR_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let upstream_port: u16 = parse_or("IBKR_PORT", get("IBKR_PORT"), 7496)?;
        config.upstream = UpstreamConfig {
            base_url: get("IBKR_BASE_URL")
                .unwrap_or_else(|| format!("http://{}:{}", upstream_host, upstream_port)),
            timeout_secs: parse_or(
                "IBKR_TIMEOUT_SECS",
                get("IBKR_TIMEOUT_SECS"),
                upstream_defaults.timeout_secs,
            )?,
            accept_invalid_certs: parse_bool_or(
                "IBKR_ACCEPT_INVALID_CERTS",
                get("IBKR_ACCEPT_INVALID_CERTS"),
                upstream_defaults.accept_invalid_certs,
            )?,
        };

        config.auth.api_key = get("API_KEY");

        if let Some(raw) = get("ALLOWED_ORIGINS") {
            config.cors.allowed_origins = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.rate_limit.requests = parse_or(
            "RATE_LIMIT_REQUESTS",
            get("RATE_LIMIT_REQUESTS"),
            config.rate_limit.requests,
        )?;
        config.rate_limit.window_secs = parse_or(
            "RATE_LIMIT_WINDOW_SECS",
            get("RATE_LIMIT_WINDOW_SECS"),
            config.rate_limit.window_secs,
        )?;

        if let Some(raw) = get("EXPOSE_UPSTREAM_ERRORS") {
            config.security.error_exposure = if parse_bool("EXPOSE_UPSTREAM_ERRORS", &raw)? {
                ErrorExposure::Verbatim
            } else {
                ErrorExposure::Sanitized
            };
        }
        config.security.request_timeout_secs = parse_or(
            "REQUEST_TIMEOUT_SECS",
            get("REQUEST_TIMEOUT_SECS"),
            config.security.request_timeout_secs,
        )?;
        config.security.max_body_bytes = parse_or(
            "MAX_BODY_BYTES",
            get("MAX_BODY_BYTES"),
            config.security.max_body_bytes,
        )?;

        if let Some(level) = get("LOG_LEVEL") {
            config.observability.log_level = level;
        }
        config.observability.json_logs = get("LOG_FORMAT")
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(config.environment.is_production());
        config.observability.metrics_address = get("METRICS_ADDRESS")
            .map(|raw| parse_value::<SocketAddr>("METRICS_ADDRESS", &raw))
            .transpose()?;

        Ok(config)
    }
}

/// Load and validate configuration from the process environment.
pub fn load_config() -> Result<GatewayConfig, ConfigError> {
    let config = GatewayConfig::from_env()?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn parse_value<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_bool_or(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw {
        Some(raw) => parse_bool(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.profile, DeploymentProfile::Hardened);
        assert_eq!(config.server.bind_addr().to_string(), "127.0.0.1:8000");
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:7496");
        assert_eq!(config.security.error_exposure, ErrorExposure::Sanitized);
        assert!(config.auth.api_key.is_none());
        assert!(config.server.tls().is_none());
    }

    #[test]
    fn non_numeric_port_is_fatal() {
        let err = GatewayConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn upstream_url_built_from_host_and_port() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("IBKR_HOST", "10.0.0.5"),
            ("IBKR_PORT", "5000"),
        ]))
        .unwrap();
        assert_eq!(config.upstream.base_url, "http://10.0.0.5:5000");

        let config = GatewayConfig::from_lookup(lookup(&[
            ("IBKR_HOST", "10.0.0.5"),
            ("IBKR_BASE_URL", "https://gw.internal/v1/api"),
        ]))
        .unwrap();
        assert_eq!(config.upstream.base_url, "https://gw.internal/v1/api");
    }

    #[test]
    fn local_profile_exposes_errors_unless_overridden() {
        let config = GatewayConfig::from_lookup(lookup(&[("GATEWAY_PROFILE", "Local")])).unwrap();
        assert_eq!(config.profile, DeploymentProfile::Local);
        assert_eq!(config.security.error_exposure, ErrorExposure::Verbatim);

        let config = GatewayConfig::from_lookup(lookup(&[
            ("GATEWAY_PROFILE", "local"),
            ("EXPOSE_UPSTREAM_ERRORS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.security.error_exposure, ErrorExposure::Sanitized);
    }

    #[test]
    fn unknown_profile_rejected() {
        let err = GatewayConfig::from_lookup(lookup(&[("GATEWAY_PROFILE", "open")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GATEWAY_PROFILE", .. }));
    }

    #[test]
    fn origins_are_split_and_trimmed() {
        let config = GatewayConfig::from_lookup(lookup(&[(
            "ALLOWED_ORIGINS",
            "https://a.example, https://b.example ,",
        )]))
        .unwrap();
        assert_eq!(
            config.cors.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[("PORT", "  "), ("API_KEY", "")])).unwrap();
        assert_eq!(config.server.port, 8000);
        assert!(config.auth.api_key.is_none());
    }

    #[test]
    fn unknown_environment_rejected() {
        let err = GatewayConfig::from_lookup(lookup(&[("ENVIRONMENT", "prodution")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "ENVIRONMENT", .. }));

        let config = GatewayConfig::from_lookup(lookup(&[("ENVIRONMENT", "Development")])).unwrap();
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn production_defaults_to_json_logs() {
        let config = GatewayConfig::from_lookup(lookup(&[("ENVIRONMENT", "production")])).unwrap();
        assert!(config.environment.is_production());
        assert!(config.observability.json_logs);
    }
}
