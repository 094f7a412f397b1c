//! Pipeline builder with validation.

use super::{PipelineRunner, RunnerConfig};
use crate::context::StageContext;
use crate::errors::ConfigurationError;
use crate::events::StageObserver;
use crate::stages::{fn_stage, Stage};
use std::future::Future;
use std::sync::Arc;

/// Builder for creating validated runners.
///
/// Stages run in the order they are added.
#[derive(Clone)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    config: RunnerConfig,
    observers: Vec<Arc<dyn StageObserver>>,
}

impl std::fmt::Debug for PipelineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineBuilder")
            .field("name", &self.name)
            .field("stages", &self.stages)
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl PipelineBuilder {
    /// Creates a new pipeline builder.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            config: RunnerConfig::default(),
            observers: Vec::new(),
        }
    }

    /// Appends a stage.
    #[must_use]
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn stage_arc(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a stage backed by an async closure.
    #[must_use]
    pub fn stage_fn<F, Fut>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(StageContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
    {
        self.stages.push(fn_stage(name, func));
        self
    }

    /// Sets the runner configuration.
    #[must_use]
    pub fn config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers an observer on the runner being built.
    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn StageObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Builds the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage list is empty, or a stage name is blank
    /// or used twice.
    pub fn build(self) -> Result<PipelineRunner, ConfigurationError> {
        let runner = PipelineRunner::with_config(self.name, self.stages, self.config)?;
        for observer in self.observers {
            runner.add_observer(observer);
        }
        Ok(runner)
    }
}
