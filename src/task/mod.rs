//! Cancellable single-outcome tasks.
//!
//! Every task speaks one signal protocol (see [`signal`]). Constructors
//! build tasks, operators wrap them while preserving the protocol, and
//! [`fork`] consumes them.

pub mod error;
pub mod precondition;
pub mod signal;

mod relay;
mod source;

// Constructors
pub(crate) mod make;
pub(crate) mod resolved;
pub(crate) mod timer;

// Operators
pub(crate) mod and_map;
pub(crate) mod flat_map;
pub(crate) mod map;

// Consumption and composition
pub(crate) mod fork;
pub(crate) mod pipe;

// Re-export core types
pub use error::{PreconditionViolation, TaskError, TaskResult};
pub use signal::{Signal, SignalKind, Sink, Talkback};
pub use source::Task;

// Re-export constructors
pub use make::{Cleanup, Reject, Resolve, make};
pub use resolved::{rejected, resolved};
pub use timer::{after, delay, rejected_after};

// Re-export operators
pub use and_map::{and_map, map2};
pub use flat_map::{flat_map, flat_map_error};
pub use map::{map, map_error, try_map};

// Re-export consumption
pub use fork::{CancelHandle, ForkBuilder, UnhandledError, fork};
pub use pipe::Pipe;
