//! Applicative join of two concurrently running tasks.

use crate::task::relay::Relay;
use crate::task::signal::{Signal, SignalKind, Sink};
use crate::task::source::Task;
use log::debug;
use std::sync::{Arc, Mutex, PoisonError};

enum Slot<T, E> {
    Pending,
    Settled(Result<T, E>),
    Taken,
}

impl<T, E> Slot<T, E> {
    fn fill(&mut self, outcome: Result<T, E>) {
        if matches!(self, Self::Pending) {
            *self = Self::Settled(outcome);
        }
    }

    fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }

    fn take(&mut self) -> Option<Result<T, E>> {
        match std::mem::replace(self, Self::Taken) {
            Self::Settled(outcome) => Some(outcome),
            _ => None,
        }
    }
}

/// Settlement slots of one `and_map` run.
struct Join<G, A, E> {
    func: Slot<G, E>,
    arg: Slot<A, E>,
}

impl<G, A, E> Join<G, A, E> {
    fn settle_func(&mut self, outcome: Result<G, E>) {
        self.func.fill(outcome);
    }

    fn settle_arg(&mut self, outcome: Result<A, E>) {
        self.arg.fill(outcome);
    }

    /// Both outcomes, once both sides settled. Yields at most once.
    fn ready(&mut self) -> Option<(Result<G, E>, Result<A, E>)> {
        if !(self.func.is_settled() && self.arg.is_settled()) {
            return None;
        }
        Some((self.func.take()?, self.arg.take()?))
    }
}

/// Combine settled outcomes: a function-side error wins, then an argument-side error.
fn combine<G, A, B, E>(func: Result<G, E>, arg: Result<A, E>) -> Result<B, E>
where
    G: FnOnce(A) -> B,
{
    match (func, arg) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(g), Ok(a)) => Ok(g(a)),
    }
}

fn side<T, G, A, B, E>(
    relay: &Arc<Relay>,
    join: &Arc<Mutex<Join<G, A, E>>>,
    sink: &Sink<B, E>,
    settle: fn(&mut Join<G, A, E>, Result<T, E>),
) -> Sink<T, E>
where
    T: Send + 'static,
    G: FnOnce(A) -> B + Send + 'static,
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
{
    let relay = Arc::clone(relay);
    let join = Arc::clone(join);
    let sink = sink.clone();
    Sink::new(move |signal| {
        let outcome = match signal {
            Signal::Start(talkback) => {
                relay.attach(talkback);
                return;
            }
            Signal::Data(value) => Ok(value),
            Signal::Error(failure) => Err(failure),
        };
        let ready = {
            let mut join = join.lock().unwrap_or_else(PoisonError::into_inner);
            settle(&mut *join, outcome);
            join.ready()
        };
        let Some((func, arg)) = ready else {
            return;
        };
        if !relay.finish() {
            debug!("and_map: discarding outcome of a cancelled run");
            return;
        }
        match combine(func, arg) {
            Ok(value) => sink.data(value),
            Err(failure) => sink.error(failure),
        }
    })
}

/// Apply the function produced by one task to the value produced by `arg`.
///
/// Both runs start immediately and run concurrently. Nothing is emitted
/// until both have settled, even when one side fails early, and a failing
/// side does not cancel its partner. Then:
///
/// 1. a function-side ERROR wins,
/// 2. else an argument-side ERROR,
/// 3. else DATA(`function(value)`).
///
/// Downstream receives one START; its talkback cancels both runs.
/// Chaining curries an n-ary function one argument at a time:
///
/// ```
/// use kodegen_task::{Task, resolved};
///
/// let sum: Task<i32, String> = resolved(|a: i32| move |b: i32| a + b)
///     .and_map(resolved(1))
///     .and_map(resolved(2));
/// ```
pub fn and_map<A, B, E, G>(arg: Task<A, E>) -> impl FnOnce(Task<G, E>) -> Task<B, E>
where
    A: Send + 'static,
    B: Send + 'static,
    E: Send + 'static,
    G: FnOnce(A) -> B + Send + 'static,
{
    move |func: Task<G, E>| {
        Task::from_source(move |sink: Sink<B, E>| {
            let relay = Relay::new("and_map");
            let join = Arc::new(Mutex::new(Join {
                func: Slot::Pending,
                arg: Slot::Pending,
            }));
            sink.start(relay.talkback());

            func.start(
                SignalKind::Start,
                side(&relay, &join, &sink, Join::settle_func),
            )?;
            arg.start(
                SignalKind::Start,
                side(&relay, &join, &sink, Join::settle_arg),
            )
        })
    }
}

/// Lift a binary function over two concurrently running tasks.
pub fn map2<A, B, C, E, F>(f: F, a: Task<A, E>, b: Task<B, E>) -> Task<C, E>
where
    A: Send + 'static,
    B: Send + 'static,
    C: Send + 'static,
    E: Send + 'static,
    F: Fn(A, B) -> C + Send + Sync + 'static,
{
    let f = Arc::new(f);
    a.map(move |x| {
        let f = Arc::clone(&f);
        move |y| f(x, y)
    })
    .and_map(b)
}
