//! # Stagerun
//!
//! Sequential, observable multi-stage pipelines.
//!
//! A pipeline is a fixed, ordered list of named stages. Each stage receives
//! the initial input plus the outputs of the stages before it, and the
//! runner publishes every status transition (`Idle → Running →
//! Completed | Failed`) as it happens:
//!
//! - **Sequential execution**: one stage at a time, left to right, stopping
//!   at the first failure
//! - **Observable state**: synchronous observers, an update channel and a
//!   `watch` snapshot store
//! - **Single flight**: overlapping runs are rejected, never queued
//! - **Generative stages**: prompt a [`TextGenerator`](generation::TextGenerator)
//!   backend, with a hosted HTTP client behind the `gemini` feature
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stagerun::prelude::*;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = PipelineBuilder::new("greeting")
//!     .stage_fn("shout", |ctx: StageContext| async move {
//!         Ok::<_, anyhow::Error>(ctx.initial_input().to_uppercase())
//!     })
//!     .stage_fn("sign", |ctx: StageContext| async move {
//!         Ok::<_, anyhow::Error>(format!("{} -- bot", ctx.previous_or_initial()))
//!     })
//!     .build()?;
//!
//! let run = runner.run("hello").await?;
//! assert_eq!(run.final_output(), Some("HELLO -- bot"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod generation;
pub mod observability;
pub mod pipeline;
pub mod resolver;
pub mod stages;
pub mod testing;
pub mod utils;
pub mod walkthrough;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::CancellationToken;
    pub use crate::context::{StageContext, StageInputs};
    pub use crate::core::{PipelineRun, StageResult, StageStatus, StageUpdate};
    pub use crate::errors::{ConfigurationError, PipelineError, StageError, StageFailure};
    pub use crate::events::{
        ChannelEvent, ChannelObserver, CollectingObserver, FnObserver, LoggingObserver,
        StageObserver,
    };
    pub use crate::generation::{GenerationConfig, GenerativeStage, TextGenerator};
    pub use crate::pipeline::{PipelineBuilder, PipelineRunner, RunnerConfig};
    pub use crate::stages::{fn_stage, Stage, TimedStage};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
