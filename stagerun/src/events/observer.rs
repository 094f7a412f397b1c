//! Observer trait and implementations.

use crate::core::{PipelineRun, StageStatus, StageUpdate};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn, Level};

/// Receives stage transitions as they happen.
///
/// Callbacks run synchronously on the runner's task, between the state
/// change and the next await point, so they should be quick. A `Running`
/// update arrives before the stage's work is polled.
pub trait StageObserver: Send + Sync {
    /// Called once per stage transition.
    fn on_update(&self, update: &StageUpdate);

    /// Called when every stage was returned to idle at once.
    fn on_reset(&self, _run: &PipelineRun) {}
}

/// An observer that discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl StageObserver for NoOpObserver {
    fn on_update(&self, _update: &StageUpdate) {}
}

/// An observer that logs transitions through `tracing`.
///
/// Failures are always logged at warn level.
#[derive(Debug, Clone)]
pub struct LoggingObserver {
    level: Level,
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingObserver {
    /// Creates a new logging observer with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging observer.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging observer.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }
}

impl StageObserver for LoggingObserver {
    fn on_update(&self, update: &StageUpdate) {
        let event = update.to_event();
        if update.status() == StageStatus::Failed {
            warn!(
                event_type = update.event_type(),
                stage = update.stage_name(),
                index = update.index,
                event_data = %event,
                "Event: {}", update.event_type()
            );
            return;
        }
        if self.level == Level::DEBUG {
            debug!(
                event_type = update.event_type(),
                stage = update.stage_name(),
                index = update.index,
                event_data = %event,
                "Event: {}", update.event_type()
            );
        } else {
            info!(
                event_type = update.event_type(),
                stage = update.stage_name(),
                index = update.index,
                event_data = %event,
                "Event: {}", update.event_type()
            );
        }
    }

    fn on_reset(&self, run: &PipelineRun) {
        debug!(pipeline = %run.pipeline, stages = run.len(), "Event: pipeline.reset");
    }
}

/// A collecting observer, mostly for tests and replay.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    updates: RwLock<Vec<StageUpdate>>,
    resets: AtomicUsize,
}

impl CollectingObserver {
    /// Creates a new collecting observer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected updates.
    #[must_use]
    pub fn updates(&self) -> Vec<StageUpdate> {
        self.updates.read().clone()
    }

    /// Returns `(index, status)` for every update, in arrival order.
    #[must_use]
    pub fn transitions(&self) -> Vec<(usize, StageStatus)> {
        self.updates
            .read()
            .iter()
            .map(|u| (u.index, u.status()))
            .collect()
    }

    /// Returns the updates for one stage.
    #[must_use]
    pub fn updates_for(&self, index: usize) -> Vec<StageUpdate> {
        self.updates
            .read()
            .iter()
            .filter(|u| u.index == index)
            .cloned()
            .collect()
    }

    /// Returns the number of collected updates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.updates.read().len()
    }

    /// Returns true if no updates have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updates.read().is_empty()
    }

    /// Number of resets observed.
    #[must_use]
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    /// Clears all collected updates.
    pub fn clear(&self) {
        self.updates.write().clear();
        self.resets.store(0, Ordering::SeqCst);
    }
}

impl StageObserver for CollectingObserver {
    fn on_update(&self, update: &StageUpdate) {
        self.updates.write().push(update.clone());
    }

    fn on_reset(&self, _run: &PipelineRun) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Adapts a closure into an observer.
pub struct FnObserver<F>
where
    F: Fn(&StageUpdate) + Send + Sync,
{
    func: F,
}

impl<F> FnObserver<F>
where
    F: Fn(&StageUpdate) + Send + Sync,
{
    /// Creates a new closure observer.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> StageObserver for FnObserver<F>
where
    F: Fn(&StageUpdate) + Send + Sync,
{
    fn on_update(&self, update: &StageUpdate) {
        (self.func)(update);
    }
}

impl<F> std::fmt::Debug for FnObserver<F>
where
    F: Fn(&StageUpdate) + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnObserver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageResult;
    use crate::utils::now_utc;
    use std::sync::Arc;

    fn running_update(index: usize) -> StageUpdate {
        let mut result = StageResult::idle(format!("s{index}"));
        result.start(now_utc());
        StageUpdate::new(None, index, result)
    }

    #[test]
    fn test_noop_observer() {
        let observer = NoOpObserver;
        observer.on_update(&running_update(0));
        observer.on_reset(&PipelineRun::new("p", ["a"]));
    }

    #[test]
    fn test_logging_observer() {
        let observer = LoggingObserver::default();
        observer.on_update(&running_update(0));
        LoggingObserver::debug().on_update(&running_update(1));
    }

    #[test]
    fn test_collecting_observer() {
        let observer = CollectingObserver::new();
        assert!(observer.is_empty());

        observer.on_update(&running_update(0));
        observer.on_update(&running_update(1));
        observer.on_reset(&PipelineRun::new("p", ["a", "b"]));

        assert_eq!(observer.len(), 2);
        assert_eq!(observer.reset_count(), 1);
        assert_eq!(
            observer.transitions(),
            vec![(0, StageStatus::Running), (1, StageStatus::Running)]
        );
        assert_eq!(observer.updates_for(1).len(), 1);

        observer.clear();
        assert!(observer.is_empty());
        assert_eq!(observer.reset_count(), 0);
    }

    #[test]
    fn test_fn_observer() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = seen.clone();
        let observer = FnObserver::new(move |update: &StageUpdate| {
            seen_clone.fetch_add(update.index + 1, Ordering::SeqCst);
        });

        observer.on_update(&running_update(2));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
