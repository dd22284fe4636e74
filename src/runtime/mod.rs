//! Runtime module
//!
//! Bridges tasks and Tokio futures in both directions.

pub mod async_task;

// Re-export async task types
pub use async_task::{AsyncTask, from_blocking, from_future};
