//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Coordinator drains produce:
//!     → logging.rs (structured log events, one span per drain)
//!     → metrics.rs (teardown outcomes, tier and drain durations)
//!
//! Consumers:
//!     → Log output (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Teardown failures surface here, never to callers of `trigger()`/`wait()`
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
