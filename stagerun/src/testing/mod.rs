//! Testing utilities for stagerun pipelines.
//!
//! This module provides:
//! - Mock stages with fixed behaviour (succeed, fail, sleep, panic, wait)
//! - A scripted text generator for generative stages
//! - Assertions over run snapshots and observed transitions

mod assertions;
mod generator;
mod mocks;

pub use assertions::{
    assert_failed_at, assert_left_to_right, assert_run_completed, assert_stage_status,
};
pub use generator::ScriptedGenerator;
pub use mocks::{
    FailingStage, GatedStage, PanickingStage, RecordedCall, RecordingStage, SlowStage, StaticStage,
};
