//! Network layer.
//!
//! Plain TCP is handled by `tokio::net::TcpListener` + `axum::serve`; this
//! module only covers TLS material for the `axum-server` rustls path.

pub mod tls;

pub use tls::load_tls_config;
