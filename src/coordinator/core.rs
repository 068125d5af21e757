//! Coordinator and the tiered drain.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::task::{self, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

use super::error::TeardownError;
use super::latch::CompletionLatch;
use super::priority::Priority;
use super::registry::{Tier, TierRegistry};
use super::teardown::{Teardown, TeardownResult};
use crate::config::ShutdownConfig;
use crate::lifecycle::signals::{Signal, SignalMonitor};
use crate::observability::metrics;

/// What a teardown task hands back: its name and its result, or the panic
/// payload if it panicked.
type Outcome = (Option<String>, Result<TeardownResult, Box<dyn Any + Send>>);

/// Callbacks still running when the deadline fired.
type Stragglers = JoinSet<Outcome>;

/// Orchestrates the shutdown of everything registered with it.
///
/// Cloning is cheap; all clones share one registry and one drain. A
/// coordinator drains at most once in its lifetime.
///
/// ```ignore
/// let closer = Coordinator::builder()
///     .deadline(Duration::from_secs(30))
///     .signals([Signal::Interrupt, Signal::Terminate])
///     .build();
///
/// closer.register_at(Priority::High, [Teardown::new(|| async { Ok(()) }).named("listener")]);
/// closer.wait().await;
/// ```
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    registry: TierRegistry,
    latch: CompletionLatch,
    triggered: AtomicBool,
    monitoring: AtomicBool,
    deadline: Option<Duration>,
}

/// Options for building a [`Coordinator`].
#[derive(Debug, Clone, Default)]
pub struct CoordinatorBuilder {
    deadline: Option<Duration>,
    signals: Vec<Signal>,
}

impl CoordinatorBuilder {
    /// Bound the whole drain by `deadline`. A zero duration means unbounded.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = (!deadline.is_zero()).then_some(deadline);
        self
    }

    /// Clear any previously configured deadline.
    pub fn no_deadline(mut self) -> Self {
        self.deadline = None;
        self
    }

    /// Add one signal that triggers the drain.
    pub fn signal(mut self, signal: Signal) -> Self {
        if !self.signals.contains(&signal) {
            self.signals.push(signal);
        }
        self
    }

    /// Replace the set of signals that trigger the drain.
    pub fn signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.signals.clear();
        signals.into_iter().fold(self, Self::signal)
    }

    /// Create the coordinator, starting its signal monitor if any signals
    /// were configured.
    pub fn build(self) -> Coordinator {
        let coordinator = Coordinator {
            inner: Arc::new(Inner {
                registry: TierRegistry::new(),
                latch: CompletionLatch::new(),
                triggered: AtomicBool::new(false),
                monitoring: AtomicBool::new(false),
                deadline: self.deadline,
            }),
        };

        if !self.signals.is_empty() && SignalMonitor::spawn(&coordinator, &self.signals) {
            coordinator.inner.monitoring.store(true, Ordering::Release);
        }

        coordinator
    }
}

impl Coordinator {
    /// A coordinator with no deadline and no signals.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> CoordinatorBuilder {
        CoordinatorBuilder::default()
    }

    /// Build from the `[shutdown]` config section.
    pub fn from_config(config: &ShutdownConfig) -> Self {
        let builder = Self::builder().signals(config.signals());
        match config.deadline() {
            Some(deadline) => builder.deadline(deadline),
            None => builder.no_deadline(),
        }
        .build()
    }

    /// Register callbacks at [`Priority::Normal`].
    pub fn register(&self, callbacks: impl IntoIterator<Item = Teardown>) {
        self.register_at(Priority::Normal, callbacks);
    }

    /// Register callbacks at `priority`.
    pub fn register_at(&self, priority: Priority, callbacks: impl IntoIterator<Item = Teardown>) {
        if self.is_triggered() {
            debug!(priority = %priority, "Teardown registered after shutdown was triggered; it may never run");
        }
        self.inner.registry.register(priority, callbacks);
    }

    /// Start the drain if it has not started yet. Returns immediately.
    ///
    /// Outside a Tokio runtime the drain runs on a dedicated thread.
    pub fn trigger(&self) {
        if self
            .inner
            .triggered
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Shutdown already triggered");
            return;
        }

        let guard = LatchGuard(self.inner.clone());
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Some(mut stragglers) = guard.0.drain().await {
                        stragglers.detach_all();
                    }
                });
            }
            Err(_) => drain_on_thread(guard),
        }
    }

    /// Wait until the drain has finished. Pends forever if nothing ever
    /// triggers it.
    pub async fn wait(&self) {
        self.inner.latch.wait().await;
    }

    /// Trigger the drain and wait for it.
    pub async fn shutdown(&self) {
        self.trigger();
        self.wait().await;
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.inner.latch.is_signaled()
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.inner.deadline
    }

    /// Whether a signal monitor is listening for this coordinator. False when
    /// no signals were configured, when it was built outside a Tokio runtime,
    /// or when no handler could be installed.
    pub fn is_monitoring(&self) -> bool {
        self.inner.monitoring.load(Ordering::Acquire)
    }

    /// Read-only view of the registered tiers.
    pub fn registry(&self) -> &TierRegistry {
        &self.inner.registry
    }

    /// A teardown that drains this coordinator and waits for it.
    ///
    /// Used to chain coordinators. Registering a coordinator's teardown with
    /// itself leaves its drain waiting on itself until the deadline fires.
    pub fn as_teardown(&self) -> Teardown {
        let coordinator = self.clone();
        Teardown::new(move || async move {
            coordinator.shutdown().await;
            Ok(())
        })
    }

    /// Consuming form of [`as_teardown`](Self::as_teardown).
    pub fn into_teardown(self) -> Teardown {
        Teardown::new(move || async move {
            self.shutdown().await;
            Ok(())
        })
    }

    pub(crate) fn downgrade(&self) -> WeakCoordinator {
        WeakCoordinator(Arc::downgrade(&self.inner))
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("deadline", &self.inner.deadline)
            .field("registered", &self.inner.registry.len())
            .field("triggered", &self.is_triggered())
            .field("monitoring", &self.is_monitoring())
            .field("complete", &self.is_complete())
            .finish()
    }
}

/// Fires the latch when dropped. Travels with the drain so waiters are
/// released even if the runtime running it shuts down first.
struct LatchGuard(Arc<Inner>);

impl Drop for LatchGuard {
    fn drop(&mut self) {
        if self.0.latch.signal() {
            warn!("Drain dropped before completion; releasing waiters");
        }
    }
}

/// Non-owning handle, held by the signal monitor.
#[derive(Clone)]
pub(crate) struct WeakCoordinator(Weak<Inner>);

impl WeakCoordinator {
    pub(crate) fn upgrade(&self) -> Option<Coordinator> {
        self.0.upgrade().map(|inner| Coordinator { inner })
    }
}

impl Inner {
    /// Run every tier and fire the latch. Returns the callbacks abandoned on
    /// deadline, if any.
    async fn drain(&self) -> Option<Stragglers> {
        let span = tracing::info_span!("drain", id = %Uuid::new_v4());
        let start = Instant::now();

        let stragglers = self.drain_tiers().instrument(span.clone()).await;
        metrics::record_drain(stragglers.is_some(), start);

        self.latch.signal();
        span.in_scope(|| {
            info!(elapsed_ms = start.elapsed().as_millis() as u64, "Drain complete");
        });

        stragglers
    }

    async fn drain_tiers(&self) -> Option<Stragglers> {
        let tiers = self.registry.take();
        let token = CancellationToken::new();

        info!(
            tiers = tiers.len(),
            deadline_ms = self.deadline.map(|d| d.as_millis() as u64),
            "Shutdown triggered, draining"
        );

        // One deadline for the entire drain, never reset per tier.
        let expires_at = self.deadline.map(|d| tokio::time::Instant::now() + d);
        let expired = async {
            match expires_at {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(expired);

        for Tier { priority, callbacks } in tiers {
            let tier_start = Instant::now();
            let mut running = JoinSet::new();

            for teardown in callbacks {
                let (name, run) = teardown.into_parts();
                let fut = AssertUnwindSafe(run(token.clone())).catch_unwind();
                running.spawn(async move { (name, fut.await) }.in_current_span());
            }

            debug!(priority = %priority, count = running.len(), "Draining tier");

            loop {
                tokio::select! {
                    biased;

                    joined = running.join_next() => match joined {
                        Some(Ok((name, Ok(result)))) => report(priority, name, result),
                        Some(Ok((name, Err(_panic)))) => {
                            let err = TeardownError::Panicked { priority, name };
                            warn!(error = %err, "Error closing");
                            metrics::record_teardown(priority, err.kind());
                            metrics::record_failure(priority, err.kind());
                        }
                        Some(Err(e)) => report_join_error(priority, e),
                        None => break,
                    },
                    () = &mut expired => {
                        let err = TeardownError::DeadlineExceeded {
                            deadline: self.deadline.unwrap_or_default(),
                            priority,
                            abandoned: running.len(),
                        };
                        warn!(error = %err, "Aborting drain");
                        metrics::record_tier(priority, tier_start);
                        token.cancel();
                        return Some(running);
                    }
                }
            }

            metrics::record_tier(priority, tier_start);
            debug!(
                priority = %priority,
                elapsed_ms = tier_start.elapsed().as_millis() as u64,
                "Tier drained"
            );
        }

        None
    }
}

fn report(priority: Priority, name: Option<String>, result: TeardownResult) {
    match result {
        Ok(()) => metrics::record_teardown(priority, "ok"),
        Err(source) => {
            let err = TeardownError::Failed {
                priority,
                name,
                source,
            };
            warn!(error = %err, "Error closing");
            metrics::record_teardown(priority, err.kind());
            metrics::record_failure(priority, err.kind());
        }
    }
}

fn report_join_error(priority: Priority, e: task::JoinError) {
    // Panics are caught inside the task and tasks are never aborted by the
    // drain, so only a runtime shutdown gets here.
    warn!(priority = %priority, error = %e, "Teardown task did not finish");
    metrics::record_teardown(priority, "cancelled");
    metrics::record_failure(priority, "cancelled");
}

/// Drive a drain without an ambient runtime. The thread stays alive until
/// abandoned callbacks finish so they are not dropped with the runtime.
///
/// If the thread or its runtime cannot be created, dropping `guard` still
/// fires the latch.
fn drain_on_thread(guard: LatchGuard) {
    let spawned = std::thread::Builder::new()
        .name("closer-drain".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "Failed to build drain runtime; skipping teardown");
                    return;
                }
            };

            runtime.block_on(async move {
                if let Some(mut stragglers) = guard.0.drain().await {
                    while stragglers.join_next().await.is_some() {}
                }
            });
        });

    if let Err(e) = spawned {
        error!(error = %e, "Failed to spawn drain thread; skipping teardown");
    }
}
