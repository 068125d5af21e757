//! Application shutdown composition.
//!
//! # Responsibilities
//! - One coordinator per traffic plane (gRPC, HTTP, admin)
//! - A root coordinator owning signals and the drain deadline
//! - Chaining: root → planes → delay → process-wide default
//!
//! # Design Decisions
//! - Planes close in a fixed order, each fully drained before the next
//! - The delay lets in-flight requests finish before shared resources
//!   (pools, clients) registered on the default coordinator are closed
//! - The root deadline bounds the whole chain

use std::time::Duration;

use tracing::{info, warn};

use crate::config::ShutdownConfig;
use crate::coordinator::{Coordinator, Teardown};
use crate::global;

/// A traffic surface with its own coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Plane {
    Grpc,
    Http,
    Admin,
}

impl Plane {
    /// Drain order of the planes.
    pub const ALL: [Plane; 3] = [Self::Grpc, Self::Http, Self::Admin];
}

impl std::fmt::Display for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Grpc => write!(f, "grpc"),
            Self::Http => write!(f, "http"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Root and per-plane coordinators of one application.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    root: Coordinator,
    grpc: Coordinator,
    http: Coordinator,
    admin: Coordinator,
}

impl Lifecycle {
    /// Build from config, chaining into the process-wide default coordinator.
    pub fn new(config: &ShutdownConfig) -> Self {
        Self::with_root(
            Coordinator::from_config(config),
            config.delay(),
            global::global().clone(),
        )
    }

    /// Build around an existing root. `ambient` is drained last, after
    /// `delay`.
    pub fn with_root(root: Coordinator, delay: Duration, ambient: Coordinator) -> Self {
        let lifecycle = Self {
            root,
            grpc: Coordinator::new(),
            http: Coordinator::new(),
            admin: Coordinator::new(),
        };

        let planes: Vec<_> = Plane::ALL
            .into_iter()
            .map(|plane| (plane, lifecycle.plane(plane).clone()))
            .collect();

        lifecycle.root.register([Teardown::new(move || async move {
            warn!("Shutting down app");

            for (plane, coordinator) in planes {
                coordinator.shutdown().await;
                info!(plane = %plane, "Plane closed");
            }
            info!("Traffic closed");

            if !delay.is_zero() {
                info!(delay_ms = delay.as_millis() as u64, "Delaying final teardown");
                tokio::time::sleep(delay).await;
            }

            ambient.shutdown().await;
            Ok(())
        })
        .named("lifecycle")]);

        lifecycle
    }

    pub fn root(&self) -> &Coordinator {
        &self.root
    }

    pub fn plane(&self, plane: Plane) -> &Coordinator {
        match plane {
            Plane::Grpc => &self.grpc,
            Plane::Http => &self.http,
            Plane::Admin => &self.admin,
        }
    }

    /// Start shutting down without waiting for a signal.
    pub fn trigger(&self) {
        self.root.trigger();
    }

    /// Block until the root coordinator, and so the whole chain, has drained.
    pub async fn run_until_shutdown(&self) {
        self.root.wait().await;
    }
}
