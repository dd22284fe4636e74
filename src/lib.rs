//! `kodegen_task` - cancellable single-outcome tasks
//!
//! A [`Task`] is an inert, reusable description of one asynchronous
//! computation that ends in at most one success value or one failure
//! value. Tasks are built from immediate values ([`resolved`],
//! [`rejected`]), from callback-style work ([`make`]), or from futures
//! ([`from_future`]); composed with [`map`], [`flat_map`], [`and_map`] and
//! friends; and finally started with [`fork`], which hands back a
//! [`CancelHandle`].
//!
//! All of it rests on one signal protocol, documented in [`task::signal`].

// Module declarations
pub mod runtime;
pub mod task;

// Re-export runtime types
pub use runtime::{AsyncTask, from_blocking, from_future};

// Re-export task types
pub use task::{
    CancelHandle, Cleanup, ForkBuilder, Pipe, PreconditionViolation, Reject, Resolve, Signal,
    SignalKind, Sink, Talkback, Task, TaskError, TaskResult, UnhandledError,
};

// Re-export constructors, operators and consumption
pub use task::{
    after, and_map, delay, flat_map, flat_map_error, fork, make, map, map2, map_error, rejected,
    rejected_after, resolved, try_map,
};
