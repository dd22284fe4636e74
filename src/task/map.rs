//! Signal-preserving transforms of the success and failure payloads.
//!
//! START and CANCEL pass straight through: the downstream sink receives the
//! upstream talkback unchanged. Transform functions run synchronously inside
//! the call that delivers DATA or ERROR; a panic in one unwinds out of that
//! call and is not turned into an ERROR signal. Use [`try_map`] for
//! transforms that can fail.

use crate::task::signal::{Signal, SignalKind, Sink};
use crate::task::source::Task;
use std::sync::Arc;

/// Transform the success value of a task.
pub fn map<A, B, E, F>(f: F) -> impl FnOnce(Task<A, E>) -> Task<B, E>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> B + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Task<A, E>| {
        Task::from_source(move |sink: Sink<B, E>| {
            let f = Arc::clone(&f);
            source.start(
                SignalKind::Start,
                Sink::new(move |signal| match signal {
                    Signal::Start(talkback) => sink.start(talkback),
                    Signal::Data(value) => sink.data(f(value)),
                    Signal::Error(error) => sink.error(error),
                }),
            )
        })
    }
}

/// Transform the failure value of a task.
pub fn map_error<A, E, F2, F>(f: F) -> impl FnOnce(Task<A, E>) -> Task<A, F2>
where
    A: Send + 'static,
    E: Send + 'static,
    F2: Send + 'static,
    F: Fn(E) -> F2 + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Task<A, E>| {
        Task::from_source(move |sink: Sink<A, F2>| {
            let f = Arc::clone(&f);
            source.start(
                SignalKind::Start,
                Sink::new(move |signal| match signal {
                    Signal::Start(talkback) => sink.start(talkback),
                    Signal::Data(value) => sink.data(value),
                    Signal::Error(error) => sink.error(f(error)),
                }),
            )
        })
    }
}

/// Transform the success value with a fallible function.
///
/// `Ok` becomes DATA, `Err` becomes ERROR. Upstream failures pass through.
pub fn try_map<A, B, E, F>(f: F) -> impl FnOnce(Task<A, E>) -> Task<B, E>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
    F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
{
    let f = Arc::new(f);
    move |source: Task<A, E>| {
        Task::from_source(move |sink: Sink<B, E>| {
            let f = Arc::clone(&f);
            source.start(
                SignalKind::Start,
                Sink::new(move |signal| match signal {
                    Signal::Start(talkback) => sink.start(talkback),
                    Signal::Data(value) => match f(value) {
                        Ok(mapped) => sink.data(mapped),
                        Err(error) => sink.error(error),
                    },
                    Signal::Error(error) => sink.error(error),
                }),
            )
        })
    }
}
