//! Signal protocol shared by every task, operator and consumer.
//!
//! A run talks to its sink with [`Signal`]s: exactly one `Start` carrying a
//! [`Talkback`], then at most one `Data` or `Error`. The sink talks back
//! upstream through the talkback, and the only request it can make is
//! [`SignalKind::Cancel`].

use std::fmt;
use std::sync::Arc;

/// The four kinds of signal in the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Start,
    Data,
    Error,
    Cancel,
}

impl SignalKind {
    /// Get string representation for log output
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Data => "data",
            Self::Error => "error",
            Self::Cancel => "cancel",
        }
    }

    /// DATA and ERROR end a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Data | Self::Error)
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A signal delivered downstream to a [`Sink`].
///
/// CANCEL has no variant here: it only ever travels upstream, through
/// [`Talkback::send`].
pub enum Signal<A, E> {
    Start(Talkback),
    Data(A),
    Error(E),
}

impl<A, E> Signal<A, E> {
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            Self::Start(_) => SignalKind::Start,
            Self::Data(_) => SignalKind::Data,
            Self::Error(_) => SignalKind::Error,
        }
    }
}

impl<A: fmt::Debug, E: fmt::Debug> fmt::Debug for Signal<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start(_) => f.write_str("Start(..)"),
            Self::Data(value) => f.debug_tuple("Data").field(value).finish(),
            Self::Error(error) => f.debug_tuple("Error").field(error).finish(),
        }
    }
}

/// Upstream channel handed to a sink with START.
///
/// Cloning is cheap (Arc clone). Every clone reaches the same run.
#[derive(Clone)]
pub struct Talkback {
    inner: Arc<dyn Fn(SignalKind) + Send + Sync>,
}

impl Talkback {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(SignalKind) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Talkback for runs with nothing to clean up.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Send a request upstream. Only [`SignalKind::Cancel`] has an effect.
    pub fn send(&self, kind: SignalKind) {
        (self.inner)(kind);
    }

    /// Request cancellation of the run.
    ///
    /// Safe to call any number of times, before or after the run settled.
    pub fn cancel(&self) {
        self.send(SignalKind::Cancel);
    }
}

impl fmt::Debug for Talkback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Talkback").finish_non_exhaustive()
    }
}

/// Downstream callback receiving a run's signals.
pub struct Sink<A, E> {
    inner: Arc<dyn Fn(Signal<A, E>) + Send + Sync>,
}

impl<A, E> Sink<A, E> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Signal<A, E>) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    pub fn send(&self, signal: Signal<A, E>) {
        (self.inner)(signal);
    }

    pub fn start(&self, talkback: Talkback) {
        self.send(Signal::Start(talkback));
    }

    pub fn data(&self, value: A) {
        self.send(Signal::Data(value));
    }

    pub fn error(&self, error: E) {
        self.send(Signal::Error(error));
    }
}

impl<A, E> Clone for Sink<A, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, E> fmt::Debug for Sink<A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}
