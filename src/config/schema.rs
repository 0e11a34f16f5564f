//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! Every section has a `Default` so tests can start from `GatewayConfig::default()`
//! and flip only the fields they care about.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

/// Placeholder value shipped in sample `.env` files. Never accepted as a credential.
pub const PLACEHOLDER_API_KEY: &str = "your_ibkr_api_key";

/// Deployment variant, from most open to most locked down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentProfile {
    /// Routes only. No auth, no rate limit, no security headers.
    Bare,
    /// Bare plus interactive API docs; must bind loopback.
    Local,
    /// Bearer auth, CORS allow-list, rate limiting, security headers, HTTPS redirect.
    #[default]
    Hardened,
}

impl DeploymentProfile {
    /// Parse a profile name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bare" => Some(Self::Bare),
            "local" => Some(Self::Local),
            "hardened" => Some(Self::Hardened),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bare => "bare",
            Self::Local => "local",
            Self::Hardened => "hardened",
        }
    }

    pub const fn is_hardened(&self) -> bool {
        matches!(self, Self::Hardened)
    }

    /// Error policy a profile gets when `EXPOSE_UPSTREAM_ERRORS` is not set.
    pub const fn default_error_exposure(&self) -> ErrorExposure {
        match self {
            Self::Bare | Self::Local => ErrorExposure::Verbatim,
            Self::Hardened => ErrorExposure::Sanitized,
        }
    }
}

/// Runtime environment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Case-insensitive; `None` for anything unrecognised.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

/// How upstream failures are reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorExposure {
    /// Map every failure to one of the canned safe messages.
    Sanitized,
    /// Return the raw upstream error text (local debugging only).
    Verbatim,
}

/// Root configuration for the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfig {
    /// Deployment variant.
    pub profile: DeploymentProfile,

    /// Development or production mode.
    pub environment: Environment,

    /// Listener configuration (bind address, TLS).
    pub server: ServerConfig,

    /// Brokerage API settings.
    pub upstream: UpstreamConfig,

    /// Bearer credential.
    pub auth: AuthConfig,

    /// CORS allow-list.
    pub cors: CorsConfig,

    /// Root route rate limit.
    pub rate_limit: RateLimitConfig,

    /// Headers, limits and error exposure.
    pub security: SecurityConfig,

    /// Logging and metrics.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            profile: DeploymentProfile::default(),
            environment: Environment::default(),
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            auth: AuthConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            security: SecurityConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Defaults for a given profile, including its error exposure policy.
    pub fn for_profile(profile: DeploymentProfile) -> Self {
        Self {
            profile,
            security: SecurityConfig {
                error_exposure: profile.default_error_exposure(),
                ..SecurityConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfig {
    /// Bind host.
    pub host: IpAddr,

    /// Bind port.
    pub port: u16,

    /// PEM private key path.
    pub tls_key_path: Option<PathBuf>,

    /// PEM certificate path.
    pub tls_cert_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8000,
            tls_key_path: None,
            tls_cert_path: None,
        }
    }
}

/// Resolved TLS file pair.
#[derive(Debug, Clone)]
pub struct TlsPaths {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// TLS is on only when both files are configured.
    pub fn tls(&self) -> Option<TlsPaths> {
        match (&self.tls_cert_path, &self.tls_key_path) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert_path: cert.clone(),
                key_path: key.clone(),
            }),
            _ => None,
        }
    }
}

/// Brokerage API configuration.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,

    /// Accept self-signed certificates (the brokerage gateway ships one).
    pub accept_invalid_certs: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7496".to_string(),
            timeout_secs: 30,
            accept_invalid_certs: false,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bearer credential configuration.
#[derive(Clone, Default, Serialize)]
pub struct AuthConfig {
    /// Shared secret. `None` when unset.
    #[serde(serialize_with = "redact")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

fn redact<S: serde::Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => s.serialize_some("[REDACTED]"),
        None => s.serialize_none(),
    }
}

/// CORS configuration (hardened profile only).
#[derive(Debug, Clone, Serialize)]
pub struct CorsConfig {
    /// Exact origins allowed to make credentialed requests.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// Fixed-window rate limit for the root route.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests: 10,
            window_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Serialize)]
pub struct SecurityConfig {
    /// How upstream errors reach the client.
    pub error_exposure: ErrorExposure,

    /// Whole-request deadline in seconds.
    pub request_timeout_secs: u64,

    /// Maximum body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            error_exposure: ErrorExposure::Sanitized,
            request_timeout_secs: 30,
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ObservabilityConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON log lines.
    pub json_logs: bool,

    /// Prometheus listener address; metrics export is off when `None`.
    pub metrics_address: Option<SocketAddr>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "portfolio_gateway=info,tower_http=info".to_string(),
            json_logs: false,
            metrics_address: None,
        }
    }
}
