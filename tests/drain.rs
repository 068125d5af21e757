//! Drain ordering, idempotence and deadline behaviour.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use closer::{Coordinator, Priority, Teardown};
use common::{counter, Event, EventLog};
use tokio::time::Instant;

mod common;

const FAST: Duration = Duration::from_millis(5);

fn tiered(c: &Coordinator, log: &EventLog, slow: Duration) {
    c.register_at(Priority::Low, [log.sleeper("low", slow)]);
    c.register_at(Priority::Normal, [log.sleeper("normal-a", FAST), log.sleeper("normal-b", FAST)]);
    c.register_at(Priority::High, [log.sleeper("high-a", FAST), log.sleeper("high-b", FAST)]);
}

#[tokio::test]
async fn test_tiers_drain_high_to_low() {
    let c = Coordinator::new();
    let log = EventLog::new();
    tiered(&c, &log, Duration::from_millis(20));

    c.shutdown().await;

    let last_end = |labels: &[&'static str]| {
        labels
            .iter()
            .map(|l| log.position(&Event::End(*l)).unwrap())
            .max()
            .unwrap()
    };
    let first_start = |labels: &[&'static str]| {
        labels
            .iter()
            .map(|l| log.position(&Event::Start(*l)).unwrap())
            .min()
            .unwrap()
    };

    assert!(last_end(&["high-a", "high-b"]) < first_start(&["normal-a", "normal-b"]));
    assert!(last_end(&["normal-a", "normal-b"]) < first_start(&["low"]));
    assert_eq!(log.events().len(), 10);
}

#[tokio::test]
async fn test_custom_priorities_interleave() {
    let c = Coordinator::new();
    let log = EventLog::new();

    c.register_at(Priority::Custom(-50), [log.sleeper("minus-fifty", FAST)]);
    c.register_at(Priority::Low, [log.sleeper("low", FAST)]);
    c.register_at(Priority::Custom(50), [log.sleeper("fifty", FAST)]);
    c.register_at(Priority::High, [log.sleeper("high", FAST)]);
    c.register(Some(log.sleeper("normal", FAST)));

    c.shutdown().await;

    let starts: Vec<_> = log
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Start(label) => Some(label),
            Event::End(_) => None,
        })
        .collect();
    assert_eq!(starts, vec!["high", "fifty", "normal", "minus-fifty", "low"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_triggers_drain_once() {
    const CALLERS: usize = 32;

    let c = Coordinator::new();
    let runs = Arc::new(AtomicUsize::new(0));
    for priority in [Priority::High, Priority::Normal, Priority::Low] {
        let runs = runs.clone();
        c.register_at(
            priority,
            [Teardown::new(move || async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })],
        );
    }

    let mut callers = tokio::task::JoinSet::new();
    for _ in 0..CALLERS {
        let c = c.clone();
        let runs = runs.clone();
        callers.spawn(async move {
            c.trigger();
            c.wait().await;
            assert!(c.is_complete());
            runs.load(Ordering::SeqCst)
        });
    }

    while let Some(seen) = callers.join_next().await {
        assert_eq!(seen.unwrap(), 3);
    }
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_wait_before_trigger() {
    let c = Coordinator::new();
    let count = Arc::new(AtomicUsize::new(0));
    c.register([counter(&count), counter(&count)]);

    let waiter = {
        let c = c.clone();
        tokio::spawn(async move { c.wait().await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    c.trigger();
    waiter.await.unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_deadline_aborts_remaining_tiers() {
    let c = Coordinator::builder().deadline(Duration::from_secs(1)).build();
    let log = EventLog::new();
    tiered(&c, &log, Duration::from_secs(2));

    let start = Instant::now();
    c.shutdown().await;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_secs(1), "returned early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(2), "waited for slow tier: {:?}", elapsed);

    for label in ["high-a", "high-b", "normal-a", "normal-b"] {
        assert!(log.contains(&Event::End(label)), "{} did not finish", label);
    }
    assert!(log.contains(&Event::Start("low")));
    assert!(!log.contains(&Event::End("low")));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_never_starts_later_tiers() {
    let c = Coordinator::builder().deadline(Duration::from_millis(100)).build();
    let log = EventLog::new();

    c.register_at(Priority::High, [log.sleeper("slow-high", Duration::from_secs(5))]);
    c.register_at(Priority::Low, [log.sleeper("low", FAST)]);

    c.shutdown().await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert!(!log.contains(&Event::Start("low")));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_is_not_reset_per_tier() {
    let c = Coordinator::builder().deadline(Duration::from_millis(1000)).build();
    let log = EventLog::new();

    c.register_at(Priority::High, [log.sleeper("high", Duration::from_millis(600))]);
    c.register_at(Priority::Normal, [log.sleeper("normal", Duration::from_millis(600))]);

    let start = Instant::now();
    c.shutdown().await;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(1000));
    assert!(elapsed < Duration::from_millis(1200));
    assert!(log.contains(&Event::End("high")));
    assert!(!log.contains(&Event::End("normal")));
}

#[tokio::test(start_paused = true)]
async fn test_same_tier_runs_concurrently() {
    let c = Coordinator::builder().deadline(Duration::from_millis(1000)).build();
    let log = EventLog::new();

    c.register_at(
        Priority::Normal,
        [
            log.sleeper("first", Duration::from_millis(600)),
            log.sleeper("second", Duration::from_millis(600)),
        ],
    );

    let start = Instant::now();
    c.shutdown().await;
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(600));
    assert!(elapsed < Duration::from_millis(1000), "tier ran sequentially: {:?}", elapsed);
    assert!(log.contains(&Event::End("first")));
    assert!(log.contains(&Event::End("second")));
    assert!(log.position(&Event::Start("second")).unwrap() < log.position(&Event::End("first")).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_without_deadline_waits_for_slow_tier() {
    let c = Coordinator::builder()
        .deadline(Duration::from_secs(1))
        .no_deadline()
        .build();
    let log = EventLog::new();
    tiered(&c, &log, Duration::from_secs(2));

    let start = Instant::now();
    c.shutdown().await;

    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(log.contains(&Event::End("low")));
}

#[tokio::test(start_paused = true)]
async fn test_abandoned_teardown_keeps_running() {
    let c = Coordinator::builder().deadline(Duration::from_secs(1)).build();
    let log = EventLog::new();
    c.register_at(Priority::Low, [log.sleeper("straggler", Duration::from_secs(2))]);

    c.shutdown().await;
    assert!(!log.contains(&Event::End("straggler")));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(log.contains(&Event::End("straggler")));
}

#[tokio::test(start_paused = true)]
async fn test_deadline_cancels_token() {
    let c = Coordinator::builder().deadline(Duration::from_millis(100)).build();
    let observed = Arc::new(AtomicBool::new(false));

    let o = observed.clone();
    c.register(Some(Teardown::with_cancel(move |token| async move {
        token.cancelled().await;
        o.store(true, Ordering::SeqCst);
        Ok(())
    })));

    c.shutdown().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(observed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_token_not_cancelled_on_clean_drain() {
    let c = Coordinator::builder().deadline(Duration::from_secs(5)).build();
    let cancelled = Arc::new(AtomicBool::new(true));

    let flag = cancelled.clone();
    c.register(Some(Teardown::with_cancel(move |token| async move {
        flag.store(token.is_cancelled(), Ordering::SeqCst);
        Ok(())
    })));

    c.shutdown().await;
    assert!(!cancelled.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_failing_teardowns_reported_not_fatal() {
    let c = Coordinator::new();
    let count = Arc::new(AtomicUsize::new(0));

    c.register_at(
        Priority::High,
        [
            Teardown::new(|| async { Err("some_error".into()) }).named("broken"),
            Teardown::blocking(|| Err("blocking failure".into())),
            counter(&count),
        ],
    );
    c.register_at(Priority::Low, [counter(&count)]);

    c.shutdown().await;
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_chained_coordinators() {
    let root = Coordinator::new();
    let child = Coordinator::new();
    let log = EventLog::new();

    child.register(Some(log.sleeper("child", FAST)));
    root.register_at(Priority::High, [child.as_teardown()]);
    root.register_at(Priority::Low, [log.sleeper("root-low", FAST)]);

    root.shutdown().await;

    assert!(child.is_complete());
    assert!(log.position(&Event::End("child")) < log.position(&Event::Start("root-low")));
}
