//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, pretty or JSON)
//!     → metrics.rs (counters and histograms via the `metrics` facade)
//!
//! Consumers:
//!     → stdout (log aggregation picks it up)
//!     → Prometheus scrape listener (only when METRICS_ADDRESS is set)
//! ```
//!
//! # Design Decisions
//! - Request ID (`x-request-id`) is generated at the edge and shows up in every span
//! - Metric updates are cheap and silently dropped when no recorder is installed

pub mod logging;
pub mod metrics;
