//! Tests for bridging callback-style work into tasks.

use super::support::{Probe, Recorder, init_logging, signal_kinds};
use kodegen_task::{Cleanup, Signal, SignalKind, Sink, Talkback, Task, make};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_make() {
    let probe = Probe::default();
    let recorder = Recorder::<u32, String>::new();
    recorder.fork(&probe.timer(1, 1));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recorder.data(), vec![1]);
    assert!(recorder.errors().is_empty());
    assert_eq!(probe.cleanups(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_make() {
    let probe = Probe::default();
    let recorder = Recorder::<u32, String>::new();
    let handle = recorder.fork(&probe.timer(10, 1));

    handle.cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(recorder.data().is_empty());
    assert!(recorder.errors().is_empty());
    assert_eq!(probe.cleanups(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_twice_runs_cleanup_once() {
    let probe = Probe::default();
    let recorder = Recorder::<u32, String>::new();
    let handle = recorder.fork(&probe.timer(10, 1));

    handle.cancel();
    handle.cancel();
    handle.clone().cancel();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(probe.cleanups(), 1);
    assert!(handle.is_cancelled());
    assert!(recorder.data().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_after_settle_skips_cleanup() {
    let probe = Probe::default();
    let recorder = Recorder::<u32, String>::new();
    let handle = recorder.fork(&probe.timer(5, 9));

    tokio::time::sleep(Duration::from_millis(10)).await;
    handle.cancel();

    assert_eq!(recorder.data(), vec![9]);
    assert_eq!(probe.cleanups(), 0);
}

#[test]
fn test_work_starts_on_run_not_construction() {
    let probe = Probe::default();
    let task: Task<u32, String> = probe.pending();
    assert_eq!(probe.runs(), 0);

    let recorder = Recorder::new();
    recorder.fork(&task);
    recorder.fork(&task);
    assert_eq!(probe.runs(), 2);
}

#[test]
fn test_synchronous_resolve_still_starts_first() {
    let task: Task<u32, String> = make(|_reject, resolve| {
        resolve.resolve(3);
        None
    });
    assert_eq!(
        *signal_kinds(&task).lock().unwrap(),
        vec![SignalKind::Start, SignalKind::Data]
    );
}

#[test]
fn test_second_settlement_is_ignored() {
    let task: Task<u32, String> = make(|reject, resolve| {
        resolve.resolve(1);
        resolve.resolve(2);
        reject.reject("late".to_string());
        None
    });
    let recorder = Recorder::new();
    recorder.fork(&task);
    assert_eq!(recorder.data(), vec![1]);
    assert!(recorder.errors().is_empty());
}

#[test]
fn test_reject() {
    let task: Task<u32, String> = make(|reject, _resolve| {
        reject.reject("nope".to_string());
        None
    });
    let recorder = Recorder::new();
    recorder.fork(&task);
    assert_eq!(recorder.errors(), vec!["nope".to_string()]);
}

#[test]
fn test_cancel_on_start_skips_executor() {
    init_logging();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let task: Task<u32, String> = make(move |_reject, resolve| {
        counter.fetch_add(1, Ordering::SeqCst);
        resolve.resolve(1);
        None
    });

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&kinds);
    task.start(
        SignalKind::Start,
        Sink::new(move |signal: Signal<u32, String>| {
            seen.lock().unwrap().push(signal.kind());
            if let Signal::Start(talkback) = signal {
                talkback.cancel();
            }
        }),
    )
    .unwrap();

    assert_eq!(*kinds.lock().unwrap(), vec![SignalKind::Start]);
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cancel_while_executor_runs() {
    init_logging();
    let slot: Arc<Mutex<Option<Talkback>>> = Arc::new(Mutex::new(None));
    let cleanups = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&cleanups);
    let executor_slot = Arc::clone(&slot);
    let task: Task<u32, String> = make(move |_reject, resolve| {
        let talkback = executor_slot.lock().unwrap().take();
        if let Some(talkback) = talkback {
            talkback.cancel();
        }
        // Already cancelled; this settlement must be dropped.
        resolve.resolve(1);
        let counter = Arc::clone(&counter);
        let cleanup: Cleanup = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        Some(cleanup)
    });

    let kinds = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&kinds);
    let sink_slot = Arc::clone(&slot);
    task.start(
        SignalKind::Start,
        Sink::new(move |signal: Signal<u32, String>| {
            seen.lock().unwrap().push(signal.kind());
            if let Signal::Start(talkback) = signal {
                *sink_slot.lock().unwrap() = Some(talkback);
            }
        }),
    )
    .unwrap();

    assert_eq!(*kinds.lock().unwrap(), vec![SignalKind::Start]);
    assert_eq!(cleanups.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dropped_handles_release_the_sink() {
    let released = Arc::new(AtomicUsize::new(0));

    struct Released(Arc<AtomicUsize>);
    impl Drop for Released {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    let task: Task<u32, String> = make(|_reject, _resolve| None);
    let guard = Released(Arc::clone(&released));
    task.start(
        SignalKind::Start,
        Sink::new(move |_signal: Signal<u32, String>| {
            let _ = guard.0.load(Ordering::SeqCst);
        }),
    )
    .unwrap();

    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pending_task_cancel_runs_cleanup() {
    let probe = Probe::default();
    let recorder = Recorder::<u32, String>::new();
    let handle = recorder.fork(&probe.pending());
    assert!(!handle.is_settled());

    // The pending probe drops both handles but keeps its cleanup.
    handle.cancel();
    assert_eq!(probe.cleanups(), 1);
    assert!(handle.is_cancelled());
}
