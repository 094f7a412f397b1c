//! Cooperative cancellation of pipeline runs.
//!
//! Cancellation is checked between stages only; a stage that has started
//! always runs to completion or failure.

mod token;

pub use token::{CancelCallback, CancellationToken};
