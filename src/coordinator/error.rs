//! Failures reported while draining.

use std::time::Duration;

use thiserror::Error;

use super::priority::Priority;
use super::teardown::BoxError;

/// A problem observed during a drain.
///
/// These are reported to logs and metrics. They never reach the caller of
/// `trigger()` or `wait()`.
#[derive(Debug, Error)]
pub enum TeardownError {
    #[error("teardown {} at priority {priority} failed: {source}", display_name(.name))]
    Failed {
        priority: Priority,
        name: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("teardown {} at priority {priority} panicked", display_name(.name))]
    Panicked {
        priority: Priority,
        name: Option<String>,
    },

    #[error("drain deadline of {deadline:?} exceeded at priority {priority}, {abandoned} teardown(s) abandoned")]
    DeadlineExceeded {
        deadline: Duration,
        priority: Priority,
        abandoned: usize,
    },
}

impl TeardownError {
    /// Label used for the `outcome` metric dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Failed { .. } => "failed",
            Self::Panicked { .. } => "panicked",
            Self::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

fn display_name(name: &Option<String>) -> &str {
    name.as_deref().unwrap_or("<unnamed>")
}
