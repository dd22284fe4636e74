//! The `Task` value: a reusable, inert template for one cancellable run.

use crate::task::and_map::and_map;
use crate::task::error::TaskResult;
use crate::task::flat_map::{flat_map, flat_map_error};
use crate::task::fork::{CancelHandle, fork};
use crate::task::map::{map, map_error, try_map};
use crate::task::precondition::{self, START_ONLY};
use crate::task::signal::{SignalKind, Sink};
use std::fmt;
use std::sync::Arc;

type Source<A, E> = Arc<dyn Fn(Sink<A, E>) -> TaskResult<()> + Send + Sync>;

/// A deferred computation producing at most one `A` or one `E`.
///
/// Nothing happens until the task is started (usually through
/// [`Task::fork`]). Every start is an independent run with its own state,
/// so one task value can be forked any number of times.
/// Cloning is cheap (Arc clone).
pub struct Task<A, E> {
    source: Source<A, E>,
}

impl<A, E> Clone for Task<A, E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<A, E> fmt::Debug for Task<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task").finish_non_exhaustive()
    }
}

impl<A, E> Task<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    /// Build a task from a raw source function.
    ///
    /// The source receives the sink of one run and must follow the signal
    /// protocol: START first, then at most one DATA or ERROR, nothing after
    /// a CANCEL request. Prefer [`make`](crate::make) for bridging callback
    /// style work; raw sources are for operators.
    pub fn from_source<F>(source: F) -> Self
    where
        F: Fn(Sink<A, E>) -> TaskResult<()> + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(source),
        }
    }

    /// Start a run, delivering its signals to `sink`.
    ///
    /// `request` must be [`SignalKind::Start`]; anything else is a
    /// protocol violation and nothing is started.
    pub fn start(&self, request: SignalKind, sink: Sink<A, E>) -> TaskResult<()> {
        precondition::assert(request == SignalKind::Start, START_ONLY)?;
        (self.source)(sink)
    }

    /// Transform the eventual success value
    #[must_use]
    pub fn map<B, F>(self, f: F) -> Task<B, E>
    where
        B: Send + 'static,
        F: Fn(A) -> B + Send + Sync + 'static,
    {
        map(f)(self)
    }

    /// Transform the eventual failure value
    #[must_use]
    pub fn map_error<F2, F>(self, f: F) -> Task<A, F2>
    where
        F2: Send + 'static,
        F: Fn(E) -> F2 + Send + Sync + 'static,
    {
        map_error(f)(self)
    }

    /// Transform the success value with a fallible function; `Err` fails the run
    #[must_use]
    pub fn try_map<B, F>(self, f: F) -> Task<B, E>
    where
        B: Send + 'static,
        F: Fn(A) -> Result<B, E> + Send + Sync + 'static,
    {
        try_map(f)(self)
    }

    /// Continue with the task `f` builds from the success value
    #[must_use]
    pub fn flat_map<B, F>(self, f: F) -> Task<B, E>
    where
        B: Send + 'static,
        F: Fn(A) -> Task<B, E> + Send + Sync + 'static,
    {
        flat_map(f)(self)
    }

    /// Recover with the task `f` builds from the failure value
    #[must_use]
    pub fn flat_map_error<F2, F>(self, f: F) -> Task<A, F2>
    where
        F2: Send + 'static,
        F: Fn(E) -> Task<A, F2> + Send + Sync + 'static,
    {
        flat_map_error(f)(self)
    }

    /// Apply the function this task produces to the value `arg` produces.
    ///
    /// Both runs start at once; see [`and_map`](crate::and_map).
    #[must_use]
    pub fn and_map<X, B>(self, arg: Task<X, E>) -> Task<B, E>
    where
        X: Send + 'static,
        B: Send + 'static,
        A: FnOnce(X) -> B,
    {
        and_map(arg)(self)
    }

    /// Start a run, routing ERROR to `on_error` and DATA to `on_data`
    pub fn fork<OnError, OnData>(&self, on_error: OnError, on_data: OnData) -> TaskResult<CancelHandle>
    where
        OnError: Fn(E) + Send + Sync + 'static,
        OnData: Fn(A) + Send + Sync + 'static,
    {
        fork(on_error, on_data)(self.clone())
    }
}
