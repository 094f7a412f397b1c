//! Error types for stagerun.
//!
//! Two layers of errors exist: [`PipelineError`] is what the runner's public
//! operations return, and [`StageError`] is what a single stage body returns.
//! A `StageError` never escapes `run()`; the runner records it as a `Failed`
//! stage and stops.

use crate::generation::GenerationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// The main error type for runner operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A run is already in flight on this runner.
    #[error("Pipeline '{pipeline}' is busy: a run is already in progress")]
    Busy {
        /// The pipeline that rejected the call.
        pipeline: String,
    },

    /// The stage list could not be turned into a runner.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// A stage failed.
    ///
    /// `run()` records failures in the returned snapshot instead of returning
    /// this variant; it exists so callers can lift a recorded failure into an
    /// error with [`PipelineRun::failure`](crate::core::PipelineRun::failure).
    #[error("{0}")]
    StageFailure(#[from] StageFailure),
}

impl PipelineError {
    /// Creates a busy error for the named pipeline.
    #[must_use]
    pub fn busy(pipeline: impl Into<String>) -> Self {
        Self::Busy {
            pipeline: pipeline.into(),
        }
    }

    /// Returns true if this is a busy rejection.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}

/// Error raised when a stage list is rejected at configuration time.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The stages involved in the error.
    pub stages: Vec<String>,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stages: Vec::new(),
            fix_hint: None,
        }
    }

    /// Error for an empty stage list.
    #[must_use]
    pub fn empty() -> Self {
        Self::new("Pipeline has no stages")
            .with_fix_hint("Add at least one stage before configuring the runner.")
    }

    /// Error for two stages sharing a name.
    #[must_use]
    pub fn duplicate_stage(name: &str) -> Self {
        Self::new(format!("Stage name '{name}' is used more than once"))
            .with_stages(vec![name.to_string()])
            .with_fix_hint("Stage names key the outputs handed to later stages; make them unique.")
    }

    /// Error for a stage with a blank name.
    #[must_use]
    pub fn unnamed_stage(index: usize) -> Self {
        Self::new(format!("Stage at index {index} has an empty name"))
    }

    /// Sets the stages involved.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<String>) -> Self {
        self.stages = stages;
        self
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// A recorded stage failure: which stage, and why.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("Stage {index} ('{stage}') failed: {message}")]
pub struct StageFailure {
    /// Position of the failed stage.
    pub index: usize,
    /// Name of the failed stage.
    pub stage: String,
    /// Human-readable failure description.
    pub message: String,
}

impl StageFailure {
    /// Creates a new stage failure.
    #[must_use]
    pub fn new(index: usize, stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            index,
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Error returned by a single stage body.
#[derive(Debug, Error)]
pub enum StageError {
    /// The stage reported a failure with a plain message.
    #[error("{0}")]
    Failed(String),

    /// The text-generation backend failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The stage exceeded the runner's per-stage timeout.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// The stage panicked.
    #[error("stage panicked: {0}")]
    Panicked(String),

    /// Any other error raised by caller-supplied code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Creates a plain failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_error_message() {
        let err = PipelineError::busy("resolver");
        assert!(err.is_busy());
        assert!(err.to_string().contains("resolver"));
    }

    #[test]
    fn test_configuration_error_empty() {
        let err = ConfigurationError::empty();
        assert_eq!(err.to_string(), "Pipeline has no stages");
        assert!(err.fix_hint.is_some());

        let wrapped: PipelineError = err.into();
        assert!(matches!(wrapped, PipelineError::Configuration(_)));
    }

    #[test]
    fn test_configuration_error_duplicate() {
        let err = ConfigurationError::duplicate_stage("drafter");
        assert_eq!(err.stages, vec!["drafter".to_string()]);
        assert!(err.message.contains("drafter"));
    }

    #[test]
    fn test_stage_failure_display() {
        let failure = StageFailure::new(2, "evaluate", "quota exceeded");
        let text = failure.to_string();
        assert!(text.contains("Stage 2"));
        assert!(text.contains("evaluate"));
        assert!(text.contains("quota exceeded"));
    }

    #[test]
    fn test_stage_error_transparent_sources() {
        let err: StageError = anyhow::anyhow!("quota exceeded").into();
        assert_eq!(err.to_string(), "quota exceeded");

        let err: StageError = GenerationError::EmptyResponse.into();
        assert_eq!(err.to_string(), "no response received");

        let err = StageError::TimedOut(Duration::from_millis(50));
        assert_eq!(err.to_string(), "timed out after 50ms");
    }
}
