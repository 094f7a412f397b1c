//! A deterministic [`TextGenerator`] for tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::generation::{GenerationError, GenerationRequest, TextGenerator};

/// Replays queued responses in order and records every prompt.
///
/// Once the queue is empty every call gets the fallback text, or
/// [`GenerationError::EmptyResponse`] if none was set.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    queue: Mutex<VecDeque<Result<String, GenerationError>>>,
    fallback: Option<String>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    /// Creates a generator with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    #[must_use]
    pub fn respond(self, text: impl Into<String>) -> Self {
        self.queue.lock().push_back(Ok(text.into()));
        self
    }

    /// Queues a failure.
    #[must_use]
    pub fn fail(self, error: GenerationError) -> Self {
        self.queue.lock().push_back(Err(error));
        self
    }

    /// Sets the text returned once the queue is drained.
    #[must_use]
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = Some(text.into());
        self
    }

    /// Prompts received so far, in call order.
    #[must_use]
    pub fn prompts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.prompt.clone()).collect()
    }

    /// Full requests received so far, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Number of responses still queued.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.lock().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request);
        match self.queue.lock().pop_front() {
            Some(next) => next,
            None => self.fallback.clone().ok_or(GenerationError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationConfig;

    fn request(prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt, GenerationConfig::default())
    }

    #[tokio::test]
    async fn test_replays_in_order_then_falls_back() {
        let generator = ScriptedGenerator::new()
            .respond("one")
            .fail(GenerationError::Quota("quota exceeded".into()))
            .with_fallback("again");

        assert_eq!(generator.generate(request("a")).await.unwrap(), "one");
        assert!(matches!(
            generator.generate(request("b")).await,
            Err(GenerationError::Quota(_))
        ));
        assert_eq!(generator.generate(request("c")).await.unwrap(), "again");
        assert_eq!(generator.prompts(), vec!["a", "b", "c"]);
        assert_eq!(generator.remaining(), 0);
    }

    #[tokio::test]
    async fn test_drained_without_fallback_is_empty_response() {
        let generator = ScriptedGenerator::new();
        assert!(matches!(
            generator.generate(request("x")).await,
            Err(GenerationError::EmptyResponse)
        ));
    }
}
