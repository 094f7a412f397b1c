//! Single-flight sequential pipeline runner.

use super::RunnerConfig;
use crate::cancellation::CancellationToken;
use crate::context::{StageContext, StageInputs};
use crate::core::{PipelineRun, StageResult, StageUpdate};
use crate::errors::{ConfigurationError, PipelineError, StageError};
use crate::events::{ObserverSet, StageObserver};
use crate::observability::run_span;
use crate::stages::Stage;
use crate::utils::{generate_run_id, now_utc};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument};

/// Failure message recorded on a stage whose run was dropped before it finished.
pub const ABANDONED_STAGE_MESSAGE: &str = "run dropped before stage finished";

/// Runs a fixed, ordered list of stages one at a time.
///
/// Each stage sees the initial input and the outputs of the stages before
/// it. Every transition is published to registered observers and to the
/// `watch` store returned by [`subscribe`](Self::subscribe) before the
/// runner awaits anything else. A failing stage stops the run; the stages
/// after it stay idle.
///
/// Only one run may be in flight per runner. Overlapping calls to
/// [`run`](Self::run) or [`reset`](Self::reset) fail with
/// [`PipelineError::Busy`] and leave the in-flight run untouched.
pub struct PipelineRunner {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    config: RunnerConfig,
    observers: ObserverSet,
    store: watch::Sender<PipelineRun>,
    busy: AtomicBool,
}

impl PipelineRunner {
    /// Creates a runner with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `stages` is empty, or a stage name is blank or
    /// used twice.
    pub fn configure(
        name: impl Into<String>,
        stages: Vec<Arc<dyn Stage>>,
    ) -> Result<Self, ConfigurationError> {
        Self::with_config(name, stages, RunnerConfig::default())
    }

    /// Creates a runner with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Same as [`configure`](Self::configure).
    pub fn with_config(
        name: impl Into<String>,
        stages: Vec<Arc<dyn Stage>>,
        config: RunnerConfig,
    ) -> Result<Self, ConfigurationError> {
        validate_stages(&stages)?;

        let name = name.into();
        let initial = PipelineRun::new(&name, stages.iter().map(|s| s.name().to_string()));
        let (store, _) = watch::channel(initial);

        Ok(Self {
            name,
            stages,
            config,
            observers: ObserverSet::new(),
            store,
            busy: AtomicBool::new(false),
        })
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

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the runner configuration.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns true while a run or reset is in flight.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Returns a copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> PipelineRun {
        self.store.borrow().clone()
    }

    /// Subscribes to the state store; the receiver sees every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<PipelineRun> {
        self.store.subscribe()
    }

    /// Registers an observer for all future transitions.
    pub fn add_observer(&self, observer: Arc<dyn StageObserver>) {
        self.observers.add(observer);
    }

    /// Runs every stage in order, starting from `input`.
    ///
    /// Stage failures do not produce an `Err`: they are recorded on the
    /// failed stage in the returned snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if a run is already in flight.
    pub async fn run(&self, input: impl Into<String>) -> Result<PipelineRun, PipelineError> {
        self.execute(input.into(), None).await
    }

    /// Like [`run`](Self::run), but stops before the next stage once `token`
    /// is cancelled. A stage that already started is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if a run is already in flight.
    pub async fn run_with_cancellation(
        &self,
        input: impl Into<String>,
        token: &CancellationToken,
    ) -> Result<PipelineRun, PipelineError> {
        self.execute(input.into(), Some(token)).await
    }

    /// Returns every stage to idle and clears outputs and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Busy`] if a run is in flight.
    pub fn reset(&self) -> Result<(), PipelineError> {
        let _guard = BusyGuard::acquire(self)?;
        self.store.send_modify(PipelineRun::reset_all);
        self.observers.notify_reset(&self.snapshot());
        debug!(pipeline = %self.name, "Pipeline reset");
        Ok(())
    }

    async fn execute(
        &self,
        input: String,
        token: Option<&CancellationToken>,
    ) -> Result<PipelineRun, PipelineError> {
        let _guard = BusyGuard::acquire(self)?;
        let run_id = generate_run_id();

        self.store.send_modify(|run| {
            run.reset_all();
            run.run_id = Some(run_id);
            run.busy = true;
            run.started_at = Some(now_utc());
        });
        self.observers.notify_reset(&self.snapshot());

        self.run_stages(Arc::from(input), run_id, token)
            .instrument(run_span(&self.name, run_id))
            .await;

        self.store.send_modify(|run| {
            run.busy = false;
            run.finished_at = Some(now_utc());
        });
        let finished = self.snapshot();
        info!(
            pipeline = %self.name,
            run_id = %run_id,
            completed = finished.completed_count(),
            stages = finished.len(),
            duration_ms = finished.duration_ms().unwrap_or_default(),
            "Pipeline run finished"
        );
        Ok(finished)
    }

    async fn run_stages(
        &self,
        input: Arc<str>,
        run_id: uuid::Uuid,
        token: Option<&CancellationToken>,
    ) {
        info!(pipeline = %self.name, stages = self.stages.len(), "Pipeline run started");
        let mut inputs = StageInputs::new();

        for (index, stage) in self.stages.iter().enumerate() {
            if let Some(reason) = token.and_then(CancellationToken::reason) {
                info!(
                    pipeline = %self.name,
                    next_stage = stage.name(),
                    %reason,
                    "Pipeline run cancelled"
                );
                self.store.send_modify(|run| run.cancel_reason = Some(reason));
                return;
            }

            let ctx = StageContext::new(index, stage.name(), input.clone(), inputs.clone())
                .with_run_id(run_id);

            self.transition(index, |r| r.start(now_utc()));
            debug!(stage = stage.name(), index, "Stage started");

            match self.invoke(stage.as_ref(), &ctx).await {
                Ok(output) => {
                    inputs.push(stage.name(), output.clone());
                    let update = self.transition(index, |r| r.complete(output, now_utc()));
                    info!(
                        stage = stage.name(),
                        index,
                        duration_ms = update.result.duration_ms().unwrap_or_default(),
                        "Stage completed"
                    );
                }
                Err(err) => {
                    let message = err.to_string();
                    warn!(
                        stage = stage.name(),
                        index,
                        error = %message,
                        "Stage failed; aborting remaining stages"
                    );
                    self.transition(index, |r| r.fail(message));
                    return;
                }
            }
        }
    }

    /// Awaits one stage, converting timeouts and panics into stage errors.
    async fn invoke(&self, stage: &dyn Stage, ctx: &StageContext) -> Result<String, StageError> {
        let work = AssertUnwindSafe(stage.run(ctx)).catch_unwind();

        let caught = match self.config.stage_timeout() {
            Some(limit) => match tokio::time::timeout(limit, work).await {
                Ok(caught) => caught,
                Err(_) => return Err(StageError::TimedOut(limit)),
            },
            None => work.await,
        };

        caught.unwrap_or_else(|payload| Err(StageError::Panicked(panic_message(payload.as_ref()))))
    }

    /// Applies one change to one stage, then publishes it.
    fn transition(&self, index: usize, change: impl FnOnce(&mut StageResult)) -> StageUpdate {
        let mut update = None;
        self.store.send_modify(|run| {
            if let Some(result) = run.results.get_mut(index) {
                change(result);
                update = Some(StageUpdate::new(run.run_id, index, result.clone()));
            }
        });

        // `index` always comes from enumerating `self.stages`, which has the
        // same length as the stored results.
        let update = update.unwrap_or_else(|| {
            StageUpdate::new(None, index, StageResult::idle(String::new()))
        });
        self.observers.notify(&update);
        update
    }
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .field("observers", &self.observers)
            .field("busy", &self.is_busy())
            .finish()
    }
}

fn validate_stages(stages: &[Arc<dyn Stage>]) -> Result<(), ConfigurationError> {
    if stages.is_empty() {
        return Err(ConfigurationError::empty());
    }

    let mut seen = HashSet::new();
    for (index, stage) in stages.iter().enumerate() {
        let name = stage.name();
        if name.trim().is_empty() {
            return Err(ConfigurationError::unnamed_stage(index));
        }
        if !seen.insert(name) {
            return Err(ConfigurationError::duplicate_stage(name));
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Holds the busy flag for the lifetime of one run or reset.
///
/// Dropping the guard, including when a `run` future is dropped mid-stage,
/// fails any stage still marked running, notifies observers of it, then
/// clears both the published `busy` field and the atomic flag.
struct BusyGuard<'a> {
    runner: &'a PipelineRunner,
}

impl<'a> BusyGuard<'a> {
    fn acquire(runner: &'a PipelineRunner) -> Result<Self, PipelineError> {
        runner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| {
                debug!(pipeline = %runner.name, "Rejected overlapping call");
                PipelineError::busy(&runner.name)
            })?;
        Ok(Self { runner })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut abandoned = Vec::new();
        self.runner.store.send_if_modified(|run| {
            let run_id = run.run_id;
            for (index, result) in run.results.iter_mut().enumerate() {
                if result.is_running() {
                    result.fail(ABANDONED_STAGE_MESSAGE.to_string());
                    abandoned.push(StageUpdate::new(run_id, index, result.clone()));
                }
            }
            if !abandoned.is_empty() {
                run.finished_at = Some(now_utc());
            }
            let was_busy = std::mem::replace(&mut run.busy, false);
            was_busy || !abandoned.is_empty()
        });

        for update in &abandoned {
            warn!(
                pipeline = %self.runner.name,
                stage = update.stage_name(),
                index = update.index,
                "Run dropped while stage was running"
            );
            self.runner.observers.notify(update);
        }
        self.runner.busy.store(false, Ordering::SeqCst);
    }
}
