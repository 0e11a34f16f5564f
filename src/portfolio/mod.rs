//! Portfolio subsystem.
//!
//! # Data Flow
//! ```text
//! query string
//!     → types.rs (PortfolioQuery → PortfolioRequest, field errors)
//!     → service.rs (default substitution, one provider call, error policy)
//!     → provider.rs (PortfolioProvider seam)
//!     → client.rs (brokerage REST gateway over reqwest)
//!     → Portfolio (passed through as-is)
//! ```

pub mod client;
pub mod provider;
pub mod service;
pub mod types;

pub use client::HttpPortfolioClient;
pub use provider::{PortfolioProvider, UpstreamError};
pub use service::PortfolioService;
pub use types::{FieldError, Portfolio, PortfolioQuery, PortfolioRequest, ACCOUNT_ID_MAX_LEN};
