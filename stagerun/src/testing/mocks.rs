//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

use crate::context::StageContext;
use crate::errors::StageError;
use crate::stages::Stage;

/// A stage that always returns the same text.
#[derive(Debug)]
pub struct StaticStage {
    name: String,
    output: String,
    calls: AtomicUsize,
}

impl StaticStage {
    /// Creates a new static stage.
    #[must_use]
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Returns the number of times the stage was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Stage for StaticStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.output.clone())
    }
}

/// A stage that always fails with the same message.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: String,
}

impl FailingStage {
    /// Creates a new failing stage.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl Stage for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        Err(StageError::failed(&self.error))
    }
}

/// A stage that takes time to execute.
#[derive(Debug)]
pub struct SlowStage {
    name: String,
    delay: Duration,
}

impl SlowStage {
    /// Creates a new slow stage.
    #[must_use]
    pub fn new(name: impl Into<String>, delay: Duration) -> Self {
        Self {
            name: name.into(),
            delay,
        }
    }

    /// Creates a slow stage with delay in milliseconds.
    #[must_use]
    pub fn with_delay_ms(name: impl Into<String>, ms: u64) -> Self {
        Self::new(name, Duration::from_millis(ms))
    }
}

#[async_trait]
impl Stage for SlowStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        tokio::time::sleep(self.delay).await;
        Ok(format!("{} done", self.name))
    }
}

/// A stage that panics.
#[derive(Debug)]
pub struct PanickingStage {
    name: String,
    message: String,
}

impl PanickingStage {
    /// Creates a new panicking stage.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Stage for PanickingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        panic!("{}", self.message);
    }
}

/// A stage that blocks until [`release`](Self::release) is called.
#[derive(Debug)]
pub struct GatedStage {
    name: String,
    output: String,
    gate: Notify,
}

impl GatedStage {
    /// Creates a new gated stage.
    #[must_use]
    pub fn new(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output: output.into(),
            gate: Notify::new(),
        }
    }

    /// Lets the current (or next) call finish.
    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl Stage for GatedStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _ctx: &StageContext) -> Result<String, StageError> {
        self.gate.notified().await;
        Ok(self.output.clone())
    }
}

/// One recorded call to a [`RecordingStage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The initial input the stage received.
    pub initial_input: String,
    /// Names of the stages whose outputs were visible.
    pub visible_stages: Vec<String>,
}

/// A stage that records what it saw and echoes the previous output.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingStage {
    /// Creates a new recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StageContext) -> Result<String, StageError> {
        self.calls.lock().push(RecordedCall {
            initial_input: ctx.initial_input().to_string(),
            visible_stages: ctx.inputs().stages().into_iter().map(String::from).collect(),
        });
        Ok(format!("{}<{}>", self.name, ctx.previous_or_initial()))
    }
}
