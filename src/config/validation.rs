//! Configuration validation.
//!
//! # Design Decisions
//! - Liberal: misconfiguration produces warnings, never a failed load
//! - Returns all warnings, not just the first
//! - Pure function: CloserConfig → Vec<ConfigWarning>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CloserConfig;
use crate::lifecycle::signals::Signal;

/// A suspicious but tolerated configuration value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigWarning {
    #[error("shutdown.signals: unknown signal {0:?} will be ignored")]
    UnknownSignal(String),

    #[error("shutdown.timeout_ms is {0}; the drain will run without a deadline")]
    UnboundedTimeout(i64),

    #[error("observability.metrics_address {0:?} is not a socket address; metrics stay disabled")]
    BadMetricsAddress(String),
}

/// Check a parsed config for values that will be ignored or defaulted.
pub fn validate_config(config: &CloserConfig) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    for name in &config.shutdown.signals {
        if name.parse::<Signal>().is_err() {
            warnings.push(ConfigWarning::UnknownSignal(name.clone()));
        }
    }

    if config.shutdown.timeout_ms <= 0 {
        warnings.push(ConfigWarning::UnboundedTimeout(config.shutdown.timeout_ms));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        warnings.push(ConfigWarning::BadMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    warnings
}
