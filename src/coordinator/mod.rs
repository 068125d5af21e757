//! Shutdown coordination.
//!
//! # Data Flow
//! ```text
//! Components:
//!     register_at(priority, teardown) → registry.rs (tiers, under a mutex)
//!
//! trigger() (explicit call or signal monitor):
//!     one-shot gate (atomic CAS)
//!     → registry swapped out, tiers sorted high → low
//!     → per tier: spawn every teardown, fan in, race the drain deadline
//!     → latch.rs fires once
//!
//! wait():
//!     → blocks on latch.rs
//! ```
//!
//! # Design Decisions
//! - One deadline bounds the whole drain, never reset per tier
//! - Teardown failures are logged and counted, never propagated
//! - On deadline, running teardowns are abandoned (detached), not aborted;
//!   their cancellation token is cancelled so cooperative ones can stop
//! - Later tiers never start once the deadline fires

pub mod core;
pub mod error;
pub mod latch;
pub mod priority;
pub mod registry;
pub mod teardown;

pub use self::core::{Coordinator, CoordinatorBuilder};
pub use error::TeardownError;
pub use latch::CompletionLatch;
pub use priority::Priority;
pub use registry::{Tier, TierRegistry};
pub use teardown::{BoxError, Teardown, TeardownResult};
