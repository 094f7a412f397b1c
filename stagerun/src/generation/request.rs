//! Generation requests and sampling configuration.

use serde::{Deserialize, Serialize};

/// Sampling configuration sent with every prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Token budget for the model's internal reasoning.
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
    /// Upper bound on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

fn default_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_thinking_budget() -> u32 {
    4000
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            thinking_budget: default_thinking_budget(),
            max_output_tokens: None,
        }
    }
}

impl GenerationConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the thinking budget.
    #[must_use]
    pub fn with_thinking_budget(mut self, budget: u32) -> Self {
        self.thinking_budget = budget;
        self
    }

    /// Sets the output token limit.
    #[must_use]
    pub fn with_max_output_tokens(mut self, limit: u32) -> Self {
        self.max_output_tokens = Some(limit);
        self
    }
}

/// A prompt plus the configuration to sample it with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Prompt text.
    pub prompt: String,
    /// Sampling configuration.
    pub config: GenerationConfig,
}

impl GenerationRequest {
    /// Creates a new request.
    #[must_use]
    pub fn new(prompt: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            prompt: prompt.into(),
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GenerationConfig::default();
        assert_eq!(config.model, "gemini-3-pro-preview");
        assert!((config.temperature - 0.1).abs() < f32::EPSILON);
        assert_eq!(config.thinking_budget, 4000);
        assert!(config.max_output_tokens.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"thinking_budget": 8000}"#).unwrap();
        assert_eq!(config.thinking_budget, 8000);
        assert_eq!(config.model, "gemini-3-pro-preview");
    }

    #[test]
    fn test_builder() {
        let config = GenerationConfig::new()
            .with_model("flash")
            .with_temperature(0.7)
            .with_max_output_tokens(256);
        assert_eq!(config.model, "flash");
        assert_eq!(config.max_output_tokens, Some(256));
    }
}
