//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (hardened profile):
//!     → headers.rs   (response side: attach security headers to everything)
//!     → redirect.rs  (production: bounce plain HTTP to https://)
//!     → cors.rs      (origin allow-list, preflight handling)
//!     → route dispatch
//!         → rate_limit.rs (root route: fixed window per client IP)
//!         → auth.rs       (portfolio route: bearer token)
//!     → handler
//!         → sanitize.rs   (upstream failure → canned message)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Auth failures never reveal whether the key is wrong or missing server-side
//! - Raw upstream errors reach the server log only, unless the profile says otherwise

pub mod auth;
pub mod cors;
pub mod headers;
pub mod rate_limit;
pub mod redirect;
pub mod sanitize;

pub use auth::{AuthError, Authenticator, VerifiedToken};
pub use rate_limit::{Decision, FixedWindowLimiter, RateLimitState};
pub use sanitize::{classify, sanitize, SafeMessage};
