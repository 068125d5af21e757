//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT (configurable) → root coordinator trigger()
//!
//! Shutdown (shutdown.rs):
//!     root drain → gRPC plane → HTTP plane → admin plane
//!               → delay → process-wide default coordinator
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop traffic first, shared resources last
//! - Shutdown has a deadline: the root drain stops waiting once it passes

pub mod shutdown;
pub mod signals;

pub use shutdown::{Lifecycle, Plane};
pub use signals::{Signal, SignalMonitor};
