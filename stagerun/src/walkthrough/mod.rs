//! Scripted, fixed-delay step sequences.
//!
//! A walkthrough is a pipeline of [`TimedStage`]s: each step waits its delay
//! and reports a fixed message, which is enough to drive a progress display
//! through the same observer and store surfaces as a real pipeline. Nothing
//! here inspects its input.

use crate::errors::ConfigurationError;
use crate::pipeline::{PipelineBuilder, PipelineRunner};
use crate::stages::TimedStage;
use std::time::Duration;

/// Builder for a sequence of timed steps.
#[derive(Debug, Clone)]
pub struct Walkthrough {
    name: String,
    steps: Vec<TimedStage>,
}

impl Walkthrough {
    /// Creates an empty walkthrough.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn step(
        mut self,
        name: impl Into<String>,
        delay: Duration,
        message: impl Into<String>,
    ) -> Self {
        self.steps.push(TimedStage::new(name, delay, message));
        self
    }

    /// Returns the configured steps.
    #[must_use]
    pub fn steps(&self) -> &[TimedStage] {
        &self.steps
    }

    /// Sum of every step's delay.
    #[must_use]
    pub fn total_delay(&self) -> Duration {
        self.steps.iter().map(TimedStage::delay).sum()
    }

    /// Builds the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if no steps were added or step names collide.
    pub fn build(self) -> Result<PipelineRunner, ConfigurationError> {
        self.steps
            .into_iter()
            .fold(PipelineBuilder::new(self.name), |builder, step| {
                builder.stage(step)
            })
            .build()
    }

    /// The four-step sign-in animation.
    #[must_use]
    pub fn sign_in() -> Self {
        Self::new("sign-in")
            .step("handshake", Duration::from_millis(600), "Secure channel established")
            .step("identity", Duration::from_millis(800), "Identity verified")
            .step("profile", Duration::from_millis(700), "Profile loaded")
            .step("session", Duration::from_millis(500), "Session ready")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::events::CollectingObserver;
    use std::sync::Arc;

    #[test]
    fn test_empty_walkthrough_is_rejected() {
        let err = Walkthrough::new("nothing").build().unwrap_err();
        assert_eq!(err.message, "Pipeline has no stages");
    }

    #[test]
    fn test_sign_in_preset() {
        let preset = Walkthrough::sign_in();
        assert_eq!(preset.steps().len(), 4);
        assert_eq!(preset.total_delay(), Duration::from_millis(2600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_walkthrough_runs_every_step_in_order() {
        let runner = Walkthrough::sign_in().build().unwrap();
        let observer = Arc::new(CollectingObserver::new());
        runner.add_observer(observer.clone());

        let started = tokio::time::Instant::now();
        let run = runner.run("ignored").await.unwrap();

        assert!(run.is_complete());
        assert_eq!(run.final_output(), Some("Session ready"));
        assert!(started.elapsed() >= Duration::from_millis(2600));
        assert_eq!(observer.len(), 8);
        assert_eq!(observer.transitions()[7], (3, StageStatus::Completed));
    }
}
