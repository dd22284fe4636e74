//! Tests for sequencing with flat_map and flat_map_error.

use super::support::{Probe, Recorder, signal_kinds};
use kodegen_task::{
    Cleanup, SignalKind, Task, after, delay, flat_map, flat_map_error, make, map, pipe, rejected,
    resolved,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[test]
fn test_flat_map_to_resolved() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(resolved(0), flat_map(|n: i32| resolved(n + 1))));
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.data(), vec![1]);
}

#[test]
fn test_flat_map_to_rejected() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(resolved(0), flat_map(|n: i32| rejected(n + 1))));
    assert_eq!(recorder.errors(), vec![1]);
    assert!(recorder.data().is_empty());
}

#[test]
fn test_flat_map_passes_errors_through() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(rejected(7), flat_map(|n: i32| resolved(n + 1))));
    assert_eq!(recorder.errors(), vec![7]);
}

#[test]
fn test_flat_map_matches_map() {
    let g = |n: i32| n * 3 + 1;

    let chained = Recorder::<i32, String>::new();
    chained.fork(&pipe!(resolved(5), flat_map(move |n: i32| resolved(g(n)))));

    let mapped = Recorder::<i32, String>::new();
    mapped.fork(&pipe!(resolved(5), map(g)));

    assert_eq!(chained.data(), mapped.data());
    assert_eq!(chained.errors(), mapped.errors());
}

#[test]
fn test_flat_map_error_to_resolved() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(rejected(0), flat_map_error(|n: i32| resolved(n + 1))));
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.data(), vec![1]);
}

#[test]
fn test_flat_map_error_to_rejected() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(rejected(0), flat_map_error(|n: i32| rejected(n + 1))));
    assert_eq!(recorder.errors(), vec![1]);
    assert!(recorder.data().is_empty());
}

#[test]
fn test_flat_map_error_passes_data_through() {
    let recorder = Recorder::<i32, i32>::new();
    recorder.fork(&pipe!(resolved(3), flat_map_error(|n: i32| rejected(n))));
    assert_eq!(recorder.data(), vec![3]);
}

#[test]
fn test_single_start_across_substitution() {
    let task: Task<i32, i32> = resolved(1).flat_map(|n| resolved(n + 1));
    assert_eq!(
        *signal_kinds(&task).lock().unwrap(),
        vec![SignalKind::Start, SignalKind::Data]
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancel_flat_map() {
    let recorder = Recorder::<i32, i32>::new();
    let handle = recorder.fork(&pipe!(
        resolved(0),
        flat_map(|n: i32| pipe!(resolved(n + 1), delay(Duration::from_millis(10))))
    ));
    handle.cancel();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(recorder.errors().is_empty());
    assert!(recorder.data().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_replacement_starts_after_source_settles() {
    let probe = Probe::default();
    let inner = probe.clone();
    let task: Task<i32, String> = after(Duration::from_millis(10), 1).flat_map(move |_| inner.pending());
    let recorder = Recorder::new();
    recorder.fork(&task);

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(probe.runs(), 0);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(probe.runs(), 1);
}

#[test]
fn test_cancel_after_substitution_reaches_replacement_only() {
    let first = Probe::default();
    let second = Probe::default();

    // The source settles synchronously, so its cleanup is released unused.
    let cleanups = Arc::clone(&first.cleanups);
    let source: Task<i32, String> = make(move |_reject, resolve| {
        resolve.resolve(1);
        let cleanups = Arc::clone(&cleanups);
        let cleanup: Cleanup = Box::new(move || {
            cleanups.fetch_add(1, Ordering::SeqCst);
        });
        Some(cleanup)
    });
    let replacement = second.clone();
    let task = source.flat_map(move |_| replacement.pending::<i32, String>());

    let recorder = Recorder::new();
    let handle = recorder.fork(&task);
    assert_eq!(second.runs(), 1);

    handle.cancel();
    assert_eq!(second.cleanups(), 1);
    assert_eq!(first.cleanups(), 0);
    assert!(recorder.data().is_empty());
}

#[test]
fn test_cancel_before_substitution_reaches_source() {
    let probe = Probe::default();
    let replacement = Probe::default();
    let next = replacement.clone();
    let task: Task<i32, String> = probe
        .pending()
        .flat_map(move |_: i32| next.pending());

    let recorder = Recorder::new();
    let handle = recorder.fork(&task);
    handle.cancel();

    assert_eq!(probe.cleanups(), 1);
    assert_eq!(replacement.runs(), 0);
}
