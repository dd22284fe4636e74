//! Bridge callback-style asynchronous work into a task.

use crate::task::signal::{Signal, SignalKind, Sink, Talkback};
use crate::task::source::Task;
use log::{debug, trace};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Cleanup returned by an executor; runs at most once, on cancellation.
pub type Cleanup = Box<dyn FnOnce() + Send>;

enum RunState<A, E> {
    /// Waiting for resolve/reject. Holds the cleanup once the executor returned it.
    Pending {
        sink: Sink<A, E>,
        cleanup: Option<Cleanup>,
    },
    /// Every `Resolve`/`Reject` dropped before settling; the sink is released.
    Abandoned(Option<Cleanup>),
    Settled,
    Cancelled,
}

struct MakeRun<A, E> {
    state: Mutex<RunState<A, E>>,
}

impl<A, E> MakeRun<A, E> {
    fn lock(&self) -> MutexGuard<'_, RunState<A, E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn settle(&self, signal: Signal<A, E>) {
        let sink = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, RunState::Settled) {
                // Natural completion releases the cleanup without running it.
                RunState::Pending { sink, cleanup: _ } => sink,
                previous => {
                    *state = previous;
                    debug!("make: ignoring {} for a run that already ended", signal.kind());
                    return;
                }
            }
        };
        trace!("make: run settled with {}", signal.kind());
        sink.send(signal);
    }

    fn cancel(&self) {
        let cleanup = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, RunState::Cancelled) {
                RunState::Pending { sink, cleanup } => {
                    drop(sink);
                    cleanup
                }
                RunState::Abandoned(cleanup) => cleanup,
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        trace!("make: run cancelled");
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }

    /// Release the sink once nothing can settle the run anymore.
    fn abandon(&self) {
        let sink = {
            let mut state = self.lock();
            match std::mem::replace(&mut *state, RunState::Settled) {
                RunState::Pending { sink, cleanup } => {
                    *state = RunState::Abandoned(cleanup);
                    sink
                }
                previous => {
                    *state = previous;
                    return;
                }
            }
        };
        debug!("make: settle handles dropped before the run settled");
        drop(sink);
    }

    fn is_cancelled(&self) -> bool {
        matches!(*self.lock(), RunState::Cancelled)
    }

    /// Store the executor's cleanup, or run it now if cancel already happened.
    fn arm(&self, cleanup: Option<Cleanup>) {
        let Some(cleanup) = cleanup else {
            return;
        };
        let cancelled = {
            let mut state = self.lock();
            match &mut *state {
                RunState::Pending { cleanup: slot, .. } | RunState::Abandoned(slot) => {
                    *slot = Some(cleanup);
                    None
                }
                RunState::Cancelled => Some(cleanup),
                RunState::Settled => None,
            }
        };
        if let Some(cleanup) = cancelled {
            trace!("make: run cancelled while its executor was running");
            cleanup();
        }
    }
}

/// Shared by every `Resolve`/`Reject` of one run; abandons the run when the last one goes.
struct Settler<A, E> {
    run: Arc<MakeRun<A, E>>,
}

impl<A, E> Drop for Settler<A, E> {
    fn drop(&mut self) {
        self.run.abandon();
    }
}

/// Completes a [`make`] run with DATA.
///
/// Once every `Resolve` and [`Reject`] of a pending run is dropped, the run
/// can no longer settle and its downstream sink is released.
pub struct Resolve<A, E> {
    settler: Arc<Settler<A, E>>,
}

impl<A, E> Resolve<A, E> {
    /// Settle the run with `value`. Ignored once the run settled or was cancelled.
    pub fn resolve(&self, value: A) {
        self.settler.run.settle(Signal::Data(value));
    }
}

impl<A, E> Clone for Resolve<A, E> {
    fn clone(&self) -> Self {
        Self {
            settler: Arc::clone(&self.settler),
        }
    }
}

impl<A, E> fmt::Debug for Resolve<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolve").finish_non_exhaustive()
    }
}

/// Completes a [`make`] run with ERROR.
pub struct Reject<A, E> {
    settler: Arc<Settler<A, E>>,
}

impl<A, E> Reject<A, E> {
    /// Settle the run with `error`. Ignored once the run settled or was cancelled.
    pub fn reject(&self, error: E) {
        self.settler.run.settle(Signal::Error(error));
    }
}

impl<A, E> Clone for Reject<A, E> {
    fn clone(&self) -> Self {
        Self {
            settler: Arc::clone(&self.settler),
        }
    }
}

impl<A, E> fmt::Debug for Reject<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reject").finish_non_exhaustive()
    }
}

/// Build a task from an executor.
///
/// Each run emits START, then calls `executor` with a [`Reject`] and a
/// [`Resolve`] handle. The work begins inside the executor, never at
/// construction. The executor may return a [`Cleanup`], which runs exactly
/// once if the run is cancelled before it settles. A run cancelled during
/// its START never calls the executor.
///
/// ```
/// use kodegen_task::{Cleanup, make};
///
/// let task = make::<u32, String, _>(|_reject, resolve| {
///     resolve.resolve(7);
///     None::<Cleanup>
/// });
/// ```
pub fn make<A, E, F>(executor: F) -> Task<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
    F: Fn(Reject<A, E>, Resolve<A, E>) -> Option<Cleanup> + Send + Sync + 'static,
{
    Task::from_source(move |sink: Sink<A, E>| {
        let run = Arc::new(MakeRun {
            state: Mutex::new(RunState::Pending {
                sink: sink.clone(),
                cleanup: None,
            }),
        });

        let talkback_run = Arc::clone(&run);
        sink.start(Talkback::new(move |kind| {
            if kind == SignalKind::Cancel {
                talkback_run.cancel();
            }
        }));
        drop(sink);

        if run.is_cancelled() {
            trace!("make: run cancelled on start, skipping executor");
            return Ok(());
        }

        let settler = Arc::new(Settler {
            run: Arc::clone(&run),
        });
        let cleanup = executor(
            Reject {
                settler: Arc::clone(&settler),
            },
            Resolve { settler },
        );
        run.arm(cleanup);
        Ok(())
    })
}
