//! Stage trait and implementations.
//!
//! A stage is one named, asynchronous step that turns its [`StageContext`]
//! into text. Stages are immutable once handed to a runner.

mod timed;

pub use timed::TimedStage;

use crate::context::StageContext;
use crate::errors::StageError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Runs the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The initial input and the outputs of earlier stages
    ///
    /// # Returns
    ///
    /// The text the stage produced, or why it could not produce any.
    async fn run(&self, ctx: &StageContext) -> Result<String, StageError>;
}

/// A stage backed by an async closure.
///
/// The closure receives an owned copy of the context so the returned future
/// can be `'static`.
pub struct FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send,
{
    name: String,
    func: F,
    _phantom: PhantomData<fn() -> Fut>,
}

impl<F, Fut> FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send,
{
    /// Creates a new function-based stage.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: PhantomData,
        }
    }
}

impl<F, Fut> Debug for FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnStage").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F, Fut> Stage for FnStage<F, Fut>
where
    F: Fn(StageContext) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<String>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: &StageContext) -> Result<String, StageError> {
        (self.func)(ctx.clone()).await.map_err(StageError::from)
    }
}

/// Wraps an async closure into a shareable stage.
pub fn fn_stage<F, Fut>(name: impl Into<String>, func: F) -> Arc<dyn Stage>
where
    F: Fn(StageContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<String>> + Send + 'static,
{
    Arc::new(FnStage::new(name, func))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StageInputs;

    fn test_stage_context() -> StageContext {
        StageContext::new(0, "test", "hello", StageInputs::new())
    }

    #[tokio::test]
    async fn test_fn_stage_success() {
        let stage = FnStage::new("upper", |ctx: StageContext| async move {
            Ok::<_, anyhow::Error>(ctx.initial_input().to_uppercase())
        });

        assert_eq!(stage.name(), "upper");
        let output = stage.run(&test_stage_context()).await.unwrap();
        assert_eq!(output, "HELLO");
    }

    #[tokio::test]
    async fn test_fn_stage_failure_keeps_message() {
        let stage = fn_stage("broken", |_ctx| async {
            Err::<String, _>(anyhow::anyhow!("quota exceeded"))
        });

        let err = stage.run(&test_stage_context()).await.unwrap_err();
        assert!(matches!(err, StageError::Other(_)));
        assert_eq!(err.to_string(), "quota exceeded");
    }

    #[test]
    fn test_fn_stage_debug() {
        let stage = FnStage::new("dbg", |_ctx: StageContext| async {
            Ok::<_, anyhow::Error>(String::new())
        });
        assert!(format!("{stage:?}").contains("dbg"));
    }
}
