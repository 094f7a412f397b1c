//! Observation of stage transitions.
//!
//! Observers are the message-passing side of progress reporting; the
//! runner's `watch` store is the reactive-state side. Both see the same
//! transitions in the same order.

mod channel;
mod observer;

pub use channel::{ChannelEvent, ChannelObserver};
pub use observer::{
    CollectingObserver, FnObserver, LoggingObserver, NoOpObserver, StageObserver,
};

use crate::core::{PipelineRun, StageUpdate};
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;

/// A registry of observers that isolates them from each other.
///
/// A panicking observer is logged and suppressed; the remaining observers
/// and the run itself are unaffected.
#[derive(Default)]
pub struct ObserverSet {
    observers: RwLock<Vec<Arc<dyn StageObserver>>>,
}

impl ObserverSet {
    /// Creates an empty observer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer.
    pub fn add(&self, observer: Arc<dyn StageObserver>) {
        self.observers.write().push(observer);
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Returns true if no observers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Delivers a transition to every observer.
    pub fn notify(&self, update: &StageUpdate) {
        // Clone the list so an observer may register another without deadlocking.
        let observers = self.observers.read().clone();
        for observer in &observers {
            if let Err(e) = catch_unwind(AssertUnwindSafe(|| observer.on_update(update))) {
                warn!(stage = update.stage_name(), "Stage observer panicked: {:?}", e);
            }
        }
    }

    /// Delivers a reset to every observer.
    pub fn notify_reset(&self, run: &PipelineRun) {
        let observers = self.observers.read().clone();
        for observer in &observers {
            if let Err(e) = catch_unwind(AssertUnwindSafe(|| observer.on_reset(run))) {
                warn!(pipeline = %run.pipeline, "Stage observer panicked on reset: {:?}", e);
            }
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("observers", &self.len())
            .finish()
    }
}
