//! Portfolio gateway library.
//!
//! A small HTTP service that exposes a brokerage account's portfolio as a
//! read-only JSON resource, in one of three deployment profiles.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod portfolio;
pub mod security;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
