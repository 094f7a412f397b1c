//! Status update messages delivered to observers.

use super::{StageResult, StageStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stage transition: the stage index and its result after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageUpdate {
    /// Run the transition belongs to.
    pub run_id: Option<Uuid>,
    /// Index of the stage that changed.
    pub index: usize,
    /// The stage result after the transition.
    pub result: StageResult,
}

impl StageUpdate {
    /// Creates a new stage update.
    #[must_use]
    pub fn new(run_id: Option<Uuid>, index: usize, result: StageResult) -> Self {
        Self {
            run_id,
            index,
            result,
        }
    }

    /// The status the stage moved into.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        self.result.status
    }

    /// Name of the stage that changed.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.result.name
    }

    /// Event name for sinks that key on strings (e.g. "stage.running").
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self.result.status {
            StageStatus::Idle => "stage.idle",
            StageStatus::Running => "stage.running",
            StageStatus::Completed => "stage.completed",
            StageStatus::Failed => "stage.failed",
        }
    }

    /// JSON payload for structured logging or forwarding to a UI.
    #[must_use]
    pub fn to_event(&self) -> serde_json::Value {
        let mut event = serde_json::json!({
            "type": self.event_type(),
            "index": self.index,
            "stage": self.result.name,
        });
        if let Some(run_id) = self.run_id {
            event["run_id"] = serde_json::json!(run_id.to_string());
        }
        match self.result.status {
            StageStatus::Completed => {
                event["output_chars"] = serde_json::json!(self.result.output.chars().count());
                if let Some(ms) = self.result.duration_ms() {
                    event["duration_ms"] = serde_json::json!(ms);
                }
            }
            StageStatus::Failed => {
                event["error"] = serde_json::json!(self.result.error);
            }
            StageStatus::Idle | StageStatus::Running => {}
        }
        event
    }
}
