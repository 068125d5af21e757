//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid config.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::signals::Signal;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CloserConfig {
    /// Shutdown behaviour of the root coordinator.
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Deadline for the whole drain in milliseconds. Zero or negative means
    /// unbounded.
    pub timeout_ms: i64,

    /// Pause between closing traffic planes and closing the process-wide
    /// default coordinator, in milliseconds.
    pub delay_ms: u64,

    /// Signal names that trigger the drain (e.g. "SIGTERM", "INT").
    pub signals: Vec<String>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            delay_ms: 0,
            signals: vec!["SIGINT".to_string(), "SIGTERM".to_string()],
        }
    }
}

impl ShutdownConfig {
    /// Drain deadline, `None` when unbounded.
    pub fn deadline(&self) -> Option<Duration> {
        u64::try_from(self.timeout_ms)
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Parsed signals. Unknown names are skipped with a warning.
    pub fn signals(&self) -> Vec<Signal> {
        self.signals
            .iter()
            .filter_map(|name| match name.parse() {
                Ok(signal) => Some(signal),
                Err(e) => {
                    tracing::warn!(signal = %name, error = %e, "Ignoring unknown shutdown signal");
                    None
                }
            })
            .collect()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default `tracing` filter, overridden by `RUST_LOG`.
    pub log_filter: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "closer=info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CloserConfig::default();
        assert_eq!(config.shutdown.deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.shutdown.delay(), Duration::ZERO);
        assert_eq!(
            config.shutdown.signals(),
            vec![Signal::Interrupt, Signal::Terminate]
        );
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_non_positive_timeout_is_unbounded() {
        let mut shutdown = ShutdownConfig::default();
        shutdown.timeout_ms = 0;
        assert_eq!(shutdown.deadline(), None);
        shutdown.timeout_ms = -5;
        assert_eq!(shutdown.deadline(), None);
    }

    #[test]
    fn test_unknown_signals_skipped() {
        let shutdown = ShutdownConfig {
            signals: vec!["TERM".into(), "SIGBOGUS".into(), "hup".into()],
            ..Default::default()
        };
        assert_eq!(shutdown.signals(), vec![Signal::Terminate, Signal::Hangup]);
    }

    #[test]
    fn test_partial_toml() {
        let config: CloserConfig = toml::from_str(
            r#"
            [shutdown]
            timeout_ms = 1500
            "#,
        )
        .unwrap();
        assert_eq!(config.shutdown.deadline(), Some(Duration::from_millis(1500)));
        assert_eq!(config.shutdown.signals.len(), 2);
        assert_eq!(config.observability.log_filter, "closer=info");
    }
}
