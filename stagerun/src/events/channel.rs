//! Observer that forwards updates into a tokio channel.

use super::StageObserver;
use crate::core::{PipelineRun, StageUpdate};
use tokio::sync::mpsc;
use tracing::debug;

/// One item on a [`ChannelObserver`] stream.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A single stage transition.
    Update(StageUpdate),
    /// Every stage went back to idle; carries the snapshot after the reset.
    Reset(PipelineRun),
}

impl ChannelEvent {
    /// Returns the stage update, if this is one.
    #[must_use]
    pub fn as_update(&self) -> Option<&StageUpdate> {
        match self {
            Self::Update(update) => Some(update),
            Self::Reset(_) => None,
        }
    }

    /// Returns true for a reset.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        matches!(self, Self::Reset(_))
    }
}

/// Forwards every update and reset into an unbounded channel.
///
/// The receiving half is typically owned by a UI or logging task running
/// alongside the pipeline. A dropped receiver is not an error; events are
/// then discarded.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl ChannelObserver {
    /// Creates a channel observer and the receiver for its events.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StageObserver for ChannelObserver {
    fn on_update(&self, update: &StageUpdate) {
        if self.tx.send(ChannelEvent::Update(update.clone())).is_err() {
            debug!(stage = update.stage_name(), "Update receiver dropped; discarding");
        }
    }

    fn on_reset(&self, run: &PipelineRun) {
        if self.tx.send(ChannelEvent::Reset(run.clone())).is_err() {
            debug!(pipeline = %run.pipeline, "Update receiver dropped; discarding reset");
        }
    }
}
