//! Text-generation backends.
//!
//! The runner treats every stage as opaque; this module supplies the one
//! kind of stage the resolver pipeline is built from: compose a prompt from
//! the stage context, send it to a [`TextGenerator`], and return the text.

mod error;
#[cfg(feature = "gemini")]
mod gemini;
mod request;
mod stage;

pub use error::GenerationError;
#[cfg(feature = "gemini")]
pub use gemini::{GeminiClient, GeminiConfig};
pub use request::{GenerationConfig, GenerationRequest};
pub use stage::{ComposeFn, GenerativeStage};

use async_trait::async_trait;

/// A hosted or local service that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates text for the request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}
