//! Composable error collections.
//!
//! [`Aggregate`] bundles independent failures (validation steps, concurrent
//! workers) into one error value. [`StringSet`] backs its message
//! de-duplication and is usable on its own.

mod aggregate;
mod sets;

pub use aggregate::{
    aggregate_threads, as_aggregate, count_messages, create_aggregate_from_message_count_map,
    filter_out, flatten, new_aggregate, reduce, Aggregate, Matcher, MessageCountMap, Task,
};
pub use sets::StringSet;

use std::any::Any;
use thiserror::Error;

/// Type-erased error carried inside an [`Aggregate`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Returned when a precondition is violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("precondition is violated")]
pub struct PreconditionViolated;

/// A task passed to [`aggregate_threads`] panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("worker panicked: {0}")]
pub struct WorkerPanicked(pub String);

impl WorkerPanicked {
    pub(crate) fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = match payload.downcast::<String>() {
            Ok(s) => *s,
            Err(payload) => payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown panic".to_string()),
        };
        Self(message)
    }
}
