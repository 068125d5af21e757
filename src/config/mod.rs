//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (liberal semantic checks → warnings)
//!     → CloserConfig
//!     → Coordinator::from_config / Lifecycle::new
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Only unreadable or unparseable files are errors; odd values are warnings

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{CloserConfig, ObservabilityConfig, ShutdownConfig};
pub use validation::{validate_config, ConfigWarning};
