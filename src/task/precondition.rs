//! Precondition guard shared by every source and operator.

use crate::task::error::PreconditionViolation;

/// Message reported when the caller's message is compiled out.
pub const GENERIC_MESSAGE: &str = "Invariant failed";

/// Message used by the start guard.
pub const START_ONLY: &str = "sources and operators can only be started";

/// Fail with [`PreconditionViolation`] when `condition` is false.
///
/// With the `invariant-messages` feature disabled the caller's message is
/// replaced by [`GENERIC_MESSAGE`].
pub fn assert(condition: bool, message: &str) -> Result<(), PreconditionViolation> {
    if condition {
        return Ok(());
    }
    Err(PreconditionViolation {
        message: render(message),
    })
}

#[cfg(feature = "invariant-messages")]
fn render(message: &str) -> String {
    message.to_string()
}

#[cfg(not(feature = "invariant-messages"))]
fn render(_message: &str) -> String {
    GENERIC_MESSAGE.to_string()
}
