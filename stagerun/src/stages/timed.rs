//! Fixed-delay stages for cosmetic, scripted sequences.

use super::Stage;
use crate::context::StageContext;
use crate::errors::StageError;
use async_trait::async_trait;
use std::time::Duration;

/// A stage that waits a fixed delay and then yields a fixed message.
///
/// It ignores its context entirely.
#[derive(Debug, Clone)]
pub struct TimedStage {
    name: String,
    delay: Duration,
    message: String,
}

impl TimedStage {
    /// Creates a new timed stage.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            delay,
            message: message.into(),
        }
    }

    /// Creates a timed stage with a delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64, message: impl Into<String>) -> Self {
        Self::new(name, Duration::from_millis(ms), message)
    }

    /// Returns the configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl Stage for TimedStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.message.clone())
    }
}
