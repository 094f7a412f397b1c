//! Pipeline configuration and execution.
//!
//! This module provides:
//! - [`PipelineBuilder`] for assembling and validating a stage list
//! - [`PipelineRunner`], the single-flight sequential executor
//! - [`RunnerConfig`] for per-runner settings

mod builder;
mod config;
mod runner;

pub use builder::PipelineBuilder;
pub use config::RunnerConfig;
pub use runner::{PipelineRunner, ABANDONED_STAGE_MESSAGE};
