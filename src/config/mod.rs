//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional, dotenvy)
//!     → process environment
//!     → loader.rs (read variables, coerce types, apply profile defaults)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → cloned into every component that needs a slice of it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Business logic never reads the environment directly
//! - Validation separates coercion (loader) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_env_file, ConfigError};
pub use schema::{
    AuthConfig, CorsConfig, DeploymentProfile, Environment, ErrorExposure, GatewayConfig,
    ObservabilityConfig, RateLimitConfig, SecurityConfig, ServerConfig, TlsPaths, UpstreamConfig,
    PLACEHOLDER_API_KEY,
};
pub use validation::{validate_config, ValidationError};
