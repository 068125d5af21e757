//! OS signal handling.
//!
//! # Responsibilities
//! - Map configured signal names to OS signals
//! - Register handlers when a coordinator is built
//! - Trigger the coordinator's drain on the first signal received
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered synchronously during `build()`, so a signal
//!   raised right after construction is not missed
//! - Fire-once: the monitor exits after the first signal and never re-arms
//! - Holds a weak handle; a dropped coordinator ends the monitor quietly
//! - Registration failures are logged, never fatal

use futures_util::future::{select_all, BoxFuture};
use tracing::{debug, info, warn};

use crate::coordinator::core::WeakCoordinator;
use crate::coordinator::Coordinator;

/// A termination signal that can trigger a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` (Ctrl-C). The only signal available off Unix.
    Interrupt,
    /// `SIGTERM`.
    Terminate,
    /// `SIGHUP`.
    Hangup,
    /// `SIGQUIT`.
    Quit,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    pub const ALL: [Signal; 6] = [
        Self::Interrupt,
        Self::Terminate,
        Self::Hangup,
        Self::Quit,
        Self::User1,
        Self::User2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Quit => "SIGQUIT",
            Self::User1 => "SIGUSR1",
            Self::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Self::Interrupt => SignalKind::interrupt(),
            Self::Terminate => SignalKind::terminate(),
            Self::Hangup => SignalKind::hangup(),
            Self::Quit => SignalKind::quit(),
            Self::User1 => SignalKind::user_defined1(),
            Self::User2 => SignalKind::user_defined2(),
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Signal {
    type Err = String;

    /// Accepts `SIGTERM`, `TERM` or `term`, and so on.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        let bare = upper.strip_prefix("SIG").unwrap_or(&upper);

        Self::ALL
            .into_iter()
            .find(|sig| &sig.name()[3..] == bare)
            .ok_or_else(|| format!("Unknown signal: {}", s))
    }
}

/// Background listener that turns the first received signal into a
/// `trigger()` call.
pub struct SignalMonitor;

impl SignalMonitor {
    /// Register handlers for `signals` and spawn the monitor task. Returns
    /// whether a monitor is now running.
    ///
    /// Does nothing (besides logging) outside a Tokio runtime or when no
    /// handler could be registered.
    pub fn spawn(coordinator: &Coordinator, signals: &[Signal]) -> bool {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    signals = ?signals,
                    "No Tokio runtime while building coordinator; signal monitor disabled"
                );
                return false;
            }
        };

        let waiters: Vec<_> = signals.iter().copied().filter_map(listen).collect();
        if waiters.is_empty() {
            warn!(signals = ?signals, "No signal handler registered; signal monitor disabled");
            return false;
        }

        let weak = coordinator.downgrade();
        debug!(signals = ?signals, "Signal monitor started");
        handle.spawn(monitor(weak, waiters));
        true
    }
}

async fn monitor(coordinator: WeakCoordinator, waiters: Vec<BoxFuture<'static, Option<Signal>>>) {
    // Remaining listeners are dropped with `select_all`'s leftovers.
    let (received, _, _) = select_all(waiters).await;

    let Some(signal) = received else {
        debug!("Signal stream closed; signal monitor exiting");
        return;
    };

    match coordinator.upgrade() {
        Some(coordinator) => {
            info!(signal = %signal, "Received termination signal, shutting down");
            coordinator.trigger();
        }
        None => debug!(signal = %signal, "Received signal after coordinator was dropped"),
    }
}

/// Register the OS handler for `signal` now and return a future that resolves
/// when it is delivered.
#[cfg(unix)]
fn listen(signal: Signal) -> Option<BoxFuture<'static, Option<Signal>>> {
    match tokio::signal::unix::signal(signal.kind()) {
        Ok(mut stream) => Some(Box::pin(async move { stream.recv().await.map(|()| signal) })),
        Err(e) => {
            warn!(signal = %signal, error = %e, "Failed to install signal handler");
            None
        }
    }
}

#[cfg(not(unix))]
fn listen(signal: Signal) -> Option<BoxFuture<'static, Option<Signal>>> {
    match signal {
        Signal::Interrupt => Some(Box::pin(async move {
            tokio::signal::ctrl_c().await.ok().map(|()| signal)
        })),
        other => {
            warn!(signal = %other, "Signal not supported on this platform");
            None
        }
    }
}
