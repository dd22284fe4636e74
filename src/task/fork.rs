//! Consuming a task: start a run and route its outcome to callbacks.

use crate::task::error::TaskResult;
use crate::task::signal::{Signal, SignalKind, Sink, Talkback};
use crate::task::source::Task;
use log::{debug, trace, warn};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Callback<T> = Arc<dyn Fn(T) + Send + Sync>;

/// What a fork without an error callback does with an ERROR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnhandledError {
    /// Drop the error silently
    Ignore,
    /// Drop the error and emit a `log::warn!` record
    #[default]
    Log,
}

impl UnhandledError {
    /// Get string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Log => "log",
        }
    }
}

enum ForkState {
    /// Started, START not seen yet
    Starting,
    Running(Talkback),
    Settled,
    Cancelled,
}

struct ForkRun {
    state: Mutex<ForkState>,
}

impl ForkRun {
    fn lock(&self) -> MutexGuard<'_, ForkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn started(&self, talkback: Talkback) {
        let late = {
            let mut state = self.lock();
            match &*state {
                ForkState::Starting => {
                    *state = ForkState::Running(talkback);
                    None
                }
                ForkState::Cancelled => Some(talkback),
                ForkState::Running(_) | ForkState::Settled => {
                    debug!("fork: ignoring duplicate start");
                    None
                }
            }
        };
        if let Some(talkback) = late {
            talkback.cancel();
        }
    }

    /// Move to `Settled`; `false` if the run already ended.
    fn settle(&self, kind: SignalKind) -> bool {
        let mut state = self.lock();
        match &*state {
            ForkState::Starting | ForkState::Running(_) => {
                *state = ForkState::Settled;
                trace!("fork: run settled with {kind}");
                true
            }
            ForkState::Settled | ForkState::Cancelled => {
                debug!("fork: ignoring {kind} for a run that already ended");
                false
            }
        }
    }

    fn cancel(&self) {
        let talkback = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, ForkState::Cancelled) {
                ForkState::Running(talkback) => Some(talkback),
                ForkState::Starting => None,
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        trace!("fork: cancelling run");
        if let Some(talkback) = talkback {
            talkback.cancel();
        }
    }

    fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), ForkState::Cancelled)
    }

    fn is_settled(&self) -> bool {
        matches!(*self.lock(), ForkState::Settled)
    }
}

/// Handle returned by [`fork`]; cancels the run it came from.
///
/// Cloning is cheap (Arc clone). Every clone controls the same run.
#[derive(Clone)]
pub struct CancelHandle {
    run: Arc<ForkRun>,
}

impl CancelHandle {
    /// Request cancellation.
    ///
    /// Once cancelled no callback fires. Calling this again, or after the
    /// run settled, does nothing.
    pub fn cancel(&self) {
        self.run.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.run.is_cancelled()
    }

    /// Whether a callback already received the outcome
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.run.is_settled()
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.is_cancelled())
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Builder for consuming a task with optional callbacks.
pub struct ForkBuilder<A, E> {
    on_data: Option<Callback<A>>,
    on_error: Option<Callback<E>>,
    unhandled: UnhandledError,
}

impl<A, E> ForkBuilder<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_data: None,
            on_error: None,
            unhandled: UnhandledError::default(),
        }
    }

    /// Set the callback receiving DATA
    pub fn on_data(mut self, f: impl Fn(A) + Send + Sync + 'static) -> Self {
        self.on_data = Some(Arc::new(f));
        self
    }

    /// Set the callback receiving ERROR
    pub fn on_error(mut self, f: impl Fn(E) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Set the policy for ERROR when no error callback is installed
    pub fn unhandled(mut self, policy: UnhandledError) -> Self {
        self.unhandled = policy;
        self
    }

    /// Start a run of `task`
    pub fn start(self, task: &Task<A, E>) -> TaskResult<CancelHandle> {
        let run = Arc::new(ForkRun {
            state: Mutex::new(ForkState::Starting),
        });
        let handle = CancelHandle {
            run: Arc::clone(&run),
        };
        let Self {
            on_data,
            on_error,
            unhandled,
        } = self;

        task.start(
            SignalKind::Start,
            Sink::new(move |signal| match signal {
                Signal::Start(talkback) => run.started(talkback),
                Signal::Data(value) => {
                    if run.settle(SignalKind::Data)
                        && let Some(on_data) = &on_data
                    {
                        on_data(value);
                    }
                }
                Signal::Error(failure) => {
                    if !run.settle(SignalKind::Error) {
                        return;
                    }
                    match &on_error {
                        Some(on_error) => on_error(failure),
                        None => {
                            if unhandled == UnhandledError::Log {
                                warn!("fork: task failed with no error callback installed");
                            }
                        }
                    }
                }
            }),
        )?;
        Ok(handle)
    }
}

impl<A, E> Default for ForkBuilder<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Start a task, routing ERROR to `on_error` and DATA to `on_data`.
///
/// Returns the run's [`CancelHandle`]. The same task can be forked again;
/// each fork is an independent run.
pub fn fork<A, E, OnError, OnData>(
    on_error: OnError,
    on_data: OnData,
) -> impl FnOnce(Task<A, E>) -> TaskResult<CancelHandle>
where
    A: Send + 'static,
    E: Send + 'static,
    OnError: Fn(E) + Send + Sync + 'static,
    OnData: Fn(A) + Send + Sync + 'static,
{
    move |task: Task<A, E>| {
        ForkBuilder::new()
            .on_error(on_error)
            .on_data(on_data)
            .start(&task)
    }
}
