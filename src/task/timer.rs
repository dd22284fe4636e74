//! Timer-backed tasks. Runs must start inside a Tokio runtime.

use crate::task::flat_map::{flat_map, flat_map_error};
use crate::task::make::{Cleanup, make};
use crate::task::source::Task;
use log::trace;
use std::time::Duration;

fn timer<A, E>(duration: Duration, outcome: Result<A, E>) -> Task<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    make(move |reject, resolve| {
        let outcome = outcome.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            match outcome {
                Ok(value) => resolve.resolve(value),
                Err(error) => reject.reject(error),
            }
        });
        let cleanup: Cleanup = Box::new(move || {
            trace!("timer: aborting pending {duration:?} timer");
            handle.abort();
        });
        Some(cleanup)
    })
}

/// A task that resolves with `value` after `duration`.
///
/// Cancelling the run aborts the timer.
///
/// # Panics
///
/// Starting a run outside a Tokio runtime panics.
pub fn after<A, E>(duration: Duration, value: A) -> Task<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    timer(duration, Ok(value))
}

/// A task that fails with `error` after `duration`.
///
/// # Panics
///
/// Starting a run outside a Tokio runtime panics.
pub fn rejected_after<A, E>(duration: Duration, error: E) -> Task<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    timer(duration, Err(error))
}

/// Hold back the outcome of a task, success or failure, by `duration`.
pub fn delay<A, E>(duration: Duration) -> impl FnOnce(Task<A, E>) -> Task<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    move |source: Task<A, E>| {
        let delayed = flat_map(move |value| after(duration, value))(source);
        flat_map_error(move |error| rejected_after(duration, error))(delayed)
    }
}
