//! Tiered graceful-shutdown coordination.
//!
//! Components register teardown callbacks at a [`Priority`]; a single
//! trigger (explicit or from an OS signal) drains them tier by tier, highest
//! priority first, under one optional deadline.

pub mod config;
pub mod coordinator;
pub mod global;
pub mod lifecycle;
pub mod observability;

pub use config::CloserConfig;
pub use coordinator::{BoxError, Coordinator, CoordinatorBuilder, Priority, Teardown, TeardownResult};
pub use lifecycle::{Lifecycle, Plane, Signal};
