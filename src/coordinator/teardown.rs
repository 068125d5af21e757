//! Teardown callbacks.

use std::future::Future;

use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

/// Error type returned by a failing teardown callback.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a single teardown callback.
pub type TeardownResult = Result<(), BoxError>;

type TeardownFn = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, TeardownResult> + Send>;

/// A unit of shutdown work registered with a [`Coordinator`](super::Coordinator).
///
/// The callback runs at most once, on its own task, when its tier is drained.
/// Callbacks that want to stop early once the drain deadline has passed can
/// use [`Teardown::with_cancel`] and watch the token; everything else is
/// simply left running when the deadline fires.
pub struct Teardown {
    name: Option<String>,
    run: TeardownFn,
}

impl Teardown {
    /// Wrap an async closure.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = TeardownResult> + Send + 'static,
    {
        Self::with_cancel(move |_| f())
    }

    /// Wrap an async closure that receives the drain's cancellation token.
    ///
    /// The token is cancelled when the drain deadline expires.
    pub fn with_cancel<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = TeardownResult> + Send + 'static,
    {
        Self {
            name: None,
            run: Box::new(move |token| Box::pin(f(token))),
        }
    }

    /// Wrap a synchronous closure. It runs on Tokio's blocking pool.
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> TeardownResult + Send + 'static,
    {
        Self::new(move || async move { tokio::task::spawn_blocking(f).await? })
    }

    /// Attach a name used when reporting failures.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn into_parts(self) -> (Option<String>, TeardownFn) {
        (self.name, self.run)
    }
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Teardown")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
