//! Process-wide default coordinator.
//!
//! For code that cannot easily be handed a [`Coordinator`], e.g. last-resort
//! teardown deep inside a library. The instance is created on first use with
//! no deadline and no signals. How it is chained into application-level
//! coordinators is up to the application (see [`crate::lifecycle::Lifecycle`]).

use std::sync::OnceLock;

use crate::coordinator::{Coordinator, Priority, Teardown};

static DEFAULT: OnceLock<Coordinator> = OnceLock::new();

/// The process-wide coordinator.
pub fn global() -> &'static Coordinator {
    DEFAULT.get_or_init(Coordinator::new)
}

/// Register callbacks with the default coordinator at [`Priority::Normal`].
pub fn register(callbacks: impl IntoIterator<Item = Teardown>) {
    global().register(callbacks);
}

/// Register callbacks with the default coordinator at `priority`.
pub fn register_at(priority: Priority, callbacks: impl IntoIterator<Item = Teardown>) {
    global().register_at(priority, callbacks);
}

/// Start draining the default coordinator.
pub fn trigger() {
    global().trigger();
}

/// Wait for the default coordinator's drain to finish.
pub async fn wait() {
    global().wait().await;
}

/// Trigger the default coordinator and wait for it.
pub async fn shutdown() {
    global().shutdown().await;
}
