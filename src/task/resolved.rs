//! Tasks that settle immediately.

use crate::task::signal::{Sink, Talkback};
use crate::task::source::Task;

/// A task whose every run emits START then DATA(`value`), synchronously.
pub fn resolved<A, E>(value: A) -> Task<A, E>
where
    A: Clone + Send + Sync + 'static,
    E: Send + 'static,
{
    Task::from_source(move |sink: Sink<A, E>| {
        sink.start(Talkback::noop());
        sink.data(value.clone());
        Ok(())
    })
}

/// A task whose every run emits START then ERROR(`error`), synchronously.
pub fn rejected<A, E>(error: E) -> Task<A, E>
where
    A: Send + 'static,
    E: Clone + Send + Sync + 'static,
{
    Task::from_source(move |sink: Sink<A, E>| {
        sink.start(Talkback::noop());
        sink.error(error.clone());
        Ok(())
    })
}
