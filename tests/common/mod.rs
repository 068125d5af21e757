//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use closer::Teardown;

/// One observation made by a recording teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(&'static str),
    End(&'static str),
}

/// Shared, ordered log of teardown activity.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A teardown that logs its start, sleeps for `duration`, then logs its end.
    pub fn sleeper(&self, label: &'static str, duration: Duration) -> Teardown {
        let events = self.events.clone();
        Teardown::new(move || async move {
            events.lock().unwrap().push(Event::Start(label));
            tokio::time::sleep(duration).await;
            events.lock().unwrap().push(Event::End(label));
            Ok(())
        })
        .named(label)
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Position of the first event matching `event`.
    pub fn position(&self, event: &Event) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn contains(&self, event: &Event) -> bool {
        self.position(event).is_some()
    }
}

/// A teardown that only counts its invocations.
pub fn counter(count: &Arc<AtomicUsize>) -> Teardown {
    let count = count.clone();
    Teardown::new(move || async move {
        count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}
