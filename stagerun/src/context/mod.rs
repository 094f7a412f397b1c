//! Context handed to each stage.
//!
//! A stage sees the run's initial input and the outputs of every stage that
//! completed before it, in completion order.

mod inputs;
mod stage;

pub use inputs::{PriorOutput, StageInputs};
pub use stage::StageContext;
