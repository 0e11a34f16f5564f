//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, interceptor chain, profile-dependent routes)
//!     → request.rs (request ID generated and echoed)
//!     → routes.rs (root, health, portfolio handlers)
//!     → error.rs (every failure rendered as {"detail": "..."})
//!     → Send to client
//! ```

pub mod docs;
pub mod error;
pub mod request;
pub mod routes;
pub mod server;

pub use error::{ApiError, ErrorBody};
pub use request::X_REQUEST_ID;
pub use routes::{HealthCheckResponse, RootResponse};
pub use server::{AppState, HttpServer};
