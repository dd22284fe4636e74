//! Async bridges between tasks and Tokio.
//!
//! Oneshot-channel design: a forked run reports its single outcome through
//! a oneshot sender, and futures become tasks by running on Tokio behind an
//! abort handle.

use crate::task::{CancelHandle, Cleanup, ForkBuilder, Task, TaskError, TaskResult, make};
use futures::future::{AbortHandle, Abortable};
use log::trace;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::task::{Context, Poll};
use tokio::sync::oneshot;

type Outcome<A, E> = Result<A, E>;
type SharedSender<A, E> = Arc<Mutex<Option<oneshot::Sender<Outcome<A, E>>>>>;

fn deliver<A, E>(tx: &SharedSender<A, E>, outcome: Outcome<A, E>) {
    let sender = tx.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(sender) = sender {
        let _ = sender.send(outcome);
    }
}

// ============================================================================
// AsyncTask - await a forked run
// ============================================================================

/// A forked run awaited as a future.
///
/// Resolves to the run's outcome. Dropping it before completion cancels the
/// run; cancelling through [`AsyncTask::cancel`] resolves the future to
/// [`TaskError::Cancelled`]. A run released without settling, such as a
/// [`make`] run whose handles were all dropped, resolves to
/// [`TaskError::Abandoned`].
pub struct AsyncTask<A, E> {
    rx: oneshot::Receiver<Outcome<A, E>>,
    // Only the run's callbacks own the sender, so releasing the run closes `rx`.
    tx: Weak<Mutex<Option<oneshot::Sender<Outcome<A, E>>>>>,
    handle: CancelHandle,
}

impl<A, E> AsyncTask<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    /// Fork `task` and capture its outcome.
    pub fn new(task: &Task<A, E>) -> TaskResult<Self> {
        let (tx, rx) = oneshot::channel();
        let tx: SharedSender<A, E> = Arc::new(Mutex::new(Some(tx)));

        let data_tx = Arc::clone(&tx);
        let error_tx = Arc::clone(&tx);
        let handle = ForkBuilder::new()
            .on_data(move |value| deliver(&data_tx, Ok(value)))
            .on_error(move |error| deliver(&error_tx, Err(error)))
            .start(task)?;

        Ok(Self {
            rx,
            tx: Arc::downgrade(&tx),
            handle,
        })
    }

    /// Cancel the run; the future then resolves to [`TaskError::Cancelled`].
    pub fn cancel(&self) {
        self.handle.cancel();
        // Dropping the sender wakes the receiver.
        if let Some(tx) = self.tx.upgrade() {
            tx.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
    }

    /// Handle for cancelling from elsewhere without the future.
    #[inline]
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.handle.clone()
    }
}

impl<A, E> Future for AsyncTask<A, E> {
    type Output = TaskResult<Outcome<A, E>>;

    #[inline]
    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(Ok(outcome)),
            Poll::Ready(Err(_)) if self.handle.is_cancelled() => {
                Poll::Ready(Err(TaskError::Cancelled))
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(TaskError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<A, E> Drop for AsyncTask<A, E> {
    fn drop(&mut self) {
        // No-op once the run settled.
        self.handle.cancel();
    }
}

impl<A, E> Task<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
{
    /// Fork this task and await its outcome.
    ///
    /// ```no_run
    /// use kodegen_task::{Task, resolved};
    ///
    /// # async fn demo() -> kodegen_task::TaskResult<()> {
    /// let task: Task<u32, String> = resolved(7);
    /// let outcome = task.into_async()?.await?;
    /// assert_eq!(outcome, Ok(7));
    /// # Ok(())
    /// # }
    /// ```
    pub fn into_async(self) -> TaskResult<AsyncTask<A, E>> {
        AsyncTask::new(&self)
    }
}

// ============================================================================
// Futures and blocking work as tasks
// ============================================================================

/// A task whose every run spawns `factory()` on Tokio.
///
/// `Ok` becomes DATA, `Err` becomes ERROR. Cancelling the run aborts the
/// future at its next suspension point.
///
/// # Panics
///
/// Starting a run outside a Tokio runtime panics.
pub fn from_future<A, E, F, Fut>(factory: F) -> Task<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<A, E>> + Send + 'static,
{
    make(move |reject, resolve| {
        let (abort, registration) = AbortHandle::new_pair();
        let work = Abortable::new(factory(), registration);
        tokio::spawn(async move {
            match work.await {
                Ok(Ok(value)) => resolve.resolve(value),
                Ok(Err(error)) => reject.reject(error),
                Err(_aborted) => trace!("from_future: run aborted"),
            }
        });
        let cleanup: Cleanup = Box::new(move || abort.abort());
        Some(cleanup)
    })
}

/// A task whose every run executes `work` on Tokio's blocking pool.
///
/// Blocking work cannot be interrupted: cancelling the run only discards
/// its eventual result. If `work` panics the run is abandoned.
///
/// # Panics
///
/// Starting a run outside a Tokio runtime panics.
pub fn from_blocking<A, E, F>(work: F) -> Task<A, E>
where
    A: Send + 'static,
    E: Send + 'static,
    F: Fn() -> Result<A, E> + Send + Sync + 'static,
{
    let work = Arc::new(work);
    make(move |reject, resolve| {
        let work = Arc::clone(&work);
        tokio::task::spawn_blocking(move || match work() {
            Ok(value) => resolve.resolve(value),
            Err(error) => reject.reject(error),
        });
        None
    })
}
