//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT / SIGTERM → Shutdown::trigger()
//!
//! Shutdown (shutdown.rs):
//!     trigger → every subscriber (server loop, purge task) stops
//!             → in-flight requests drain → process exits
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
