//! A stage that prompts a text-generation backend.

use super::{GenerationConfig, GenerationError, GenerationRequest, TextGenerator};
use crate::context::StageContext;
use crate::errors::StageError;
use crate::stages::Stage;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Builds the prompt for a stage from its context.
pub type ComposeFn = Arc<dyn Fn(&StageContext) -> String + Send + Sync>;

/// A stage whose work is one call to a [`TextGenerator`].
///
/// Blank generated text counts as a failure.
#[derive(Clone)]
pub struct GenerativeStage {
    name: String,
    compose: ComposeFn,
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl GenerativeStage {
    /// Creates a new generative stage with the default sampling configuration.
    pub fn new<F>(name: impl Into<String>, generator: Arc<dyn TextGenerator>, compose: F) -> Self
    where
        F: Fn(&StageContext) -> String + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compose: Arc::new(compose),
            generator,
            config: GenerationConfig::default(),
        }
    }

    /// Sets the sampling configuration.
    #[must_use]
    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the sampling configuration.
    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Renders the prompt this stage would send for `ctx`.
    #[must_use]
    pub fn prompt_for(&self, ctx: &StageContext) -> String {
        (self.compose)(ctx)
    }
}

impl std::fmt::Debug for GenerativeStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerativeStage")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Stage for GenerativeStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StageContext) -> Result<String, StageError> {
        let prompt = self.prompt_for(ctx);
        debug!(
            stage = %self.name,
            model = %self.config.model,
            prompt_chars = prompt.len(),
            "Sending prompt"
        );

        let text = self
            .generator
            .generate(GenerationRequest::new(prompt, self.config.clone()))
            .await?;

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        Ok(text)
    }
}
