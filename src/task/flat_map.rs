//! Sequencing: replace a settled outcome with a brand new task.
//!
//! The replacement run only starts after the first run produced its
//! terminal signal. Downstream sees a single START whose talkback follows
//! whichever run is current, so a CANCEL after the switch reaches the
//! replacement and nothing else.

use crate::task::relay::Relay;
use crate::task::signal::{Signal, SignalKind, Sink};
use crate::task::source::Task;
use log::{debug, error};
use std::sync::Arc;

/// Continue with the task `f` builds from the success value.
pub fn flat_map<A, B, E, F>(f: F) -> impl FnOnce(Task<A, E>) -> Task<B, E>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Task<B, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Task<A, E>| {
        Task::from_source(move |sink: Sink<B, E>| {
            let relay = Relay::new("flat_map");
            sink.start(relay.talkback());

            let f = Arc::clone(&f);
            source.start(
                SignalKind::Start,
                Sink::new(move |signal| match signal {
                    Signal::Start(talkback) => relay.attach(talkback),
                    Signal::Data(value) => {
                        if relay.is_cancelled() {
                            debug!("flat_map: dropping value of a cancelled run");
                            return;
                        }
                        splice(&f(value), &relay, &sink);
                    }
                    Signal::Error(failure) => {
                        if relay.finish() {
                            sink.error(failure);
                        }
                    }
                }),
            )
        })
    }
}

/// Recover with the task `f` builds from the failure value.
pub fn flat_map_error<A, E, F2, F>(f: F) -> impl FnOnce(Task<A, E>) -> Task<A, F2>
where
    A: Send + 'static,
    E: Send + 'static,
    F2: Send + 'static,
    F: Fn(E) -> Task<A, F2> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Task<A, E>| {
        Task::from_source(move |sink: Sink<A, F2>| {
            let relay = Relay::new("flat_map_error");
            sink.start(relay.talkback());

            let f = Arc::clone(&f);
            source.start(
                SignalKind::Start,
                Sink::new(move |signal| match signal {
                    Signal::Start(talkback) => relay.attach(talkback),
                    Signal::Data(value) => {
                        if relay.finish() {
                            sink.data(value);
                        }
                    }
                    Signal::Error(failure) => {
                        if relay.is_cancelled() {
                            debug!("flat_map_error: dropping error of a cancelled run");
                            return;
                        }
                        splice(&f(failure), &relay, &sink);
                    }
                }),
            )
        })
    }
}

/// Start `next` and forward its outcome downstream.
fn splice<A, E>(next: &Task<A, E>, relay: &Arc<Relay>, sink: &Sink<A, E>)
where
    A: Send + 'static,
    E: Send + 'static,
{
    let inner_relay = Arc::clone(relay);
    let sink = sink.clone();
    let inner = Sink::new(move |signal| match signal {
        // The settled run's talkback is discarded here.
        Signal::Start(talkback) => inner_relay.replace(talkback),
        Signal::Data(value) => {
            if inner_relay.finish() {
                sink.data(value);
            }
        }
        Signal::Error(failure) => {
            if inner_relay.finish() {
                sink.error(failure);
            }
        }
    });
    if let Err(e) = next.start(SignalKind::Start, inner) {
        error!("flat_map: replacement task failed to start: {e}");
    }
}
