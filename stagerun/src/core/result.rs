//! Per-stage observable result record.

use super::StageStatus;
use crate::utils::{elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};

/// The observable status, output and timing of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage name.
    pub name: String,
    /// Current status.
    pub status: StageStatus,
    /// Text produced by the stage; empty unless `Completed`.
    #[serde(default)]
    pub output: String,
    /// Failure description; set only when `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the stage entered `Running`.
    #[serde(default)]
    pub started_at: Option<Timestamp>,
    /// When the stage completed.
    #[serde(default)]
    pub timestamp: Option<Timestamp>,
}

impl StageResult {
    /// Creates an idle result for the named stage.
    #[must_use]
    pub fn idle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: StageStatus::Idle,
            output: String::new(),
            error: None,
            started_at: None,
            timestamp: None,
        }
    }

    /// Returns true if the stage is idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.status == StageStatus::Idle
    }

    /// Returns true if the stage is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == StageStatus::Running
    }

    /// Returns true if the stage completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == StageStatus::Completed
    }

    /// Returns true if the stage failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == StageStatus::Failed
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Wall-clock time between start and completion.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        match (&self.started_at, &self.timestamp) {
            (Some(start), Some(end)) => Some(elapsed_ms(start, end)),
            _ => None,
        }
    }

    pub(crate) fn start(&mut self, at: Timestamp) {
        debug_assert!(self.status.can_transition_to(StageStatus::Running));
        self.status = StageStatus::Running;
        self.output.clear();
        self.error = None;
        self.started_at = Some(at);
        self.timestamp = None;
    }

    pub(crate) fn complete(&mut self, output: String, at: Timestamp) {
        debug_assert!(self.status.can_transition_to(StageStatus::Completed));
        self.status = StageStatus::Completed;
        self.output = output;
        self.timestamp = Some(at);
    }

    pub(crate) fn fail(&mut self, message: String) {
        debug_assert!(self.status.can_transition_to(StageStatus::Failed));
        self.status = StageStatus::Failed;
        self.error = Some(message);
    }

    pub(crate) fn reset(&mut self) {
        self.status = StageStatus::Idle;
        self.output.clear();
        self.error = None;
        self.started_at = None;
        self.timestamp = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_utc;

    #[test]
    fn test_idle_result() {
        let result = StageResult::idle("categorize");
        assert!(result.is_idle());
        assert!(result.output.is_empty());
        assert!(result.timestamp.is_none());
        assert!(result.message().is_none());
    }

    #[test]
    fn test_complete_lifecycle() {
        let mut result = StageResult::idle("categorize");
        result.start(now_utc());
        assert!(result.is_running());
        assert!(result.output.is_empty());

        result.complete("Billing".to_string(), now_utc());
        assert!(result.is_completed());
        assert_eq!(result.output, "Billing");
        assert!(result.timestamp.is_some());
        assert!(result.duration_ms().is_some());
    }

    #[test]
    fn test_fail_lifecycle() {
        let mut result = StageResult::idle("categorize");
        result.start(now_utc());
        result.fail("quota exceeded".to_string());

        assert!(result.is_failed());
        assert_eq!(result.message(), Some("quota exceeded"));
        assert!(result.timestamp.is_none());
        assert!(result.output.is_empty());
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut result = StageResult::idle("categorize");
        result.start(now_utc());
        result.complete("done".to_string(), now_utc());
        result.reset();

        assert_eq!(result, StageResult::idle("categorize"));
    }

    #[test]
    fn test_serialization_skips_missing_error() {
        let result = StageResult::idle("x");
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["status"], serde_json::json!("idle"));

        let back: StageResult = serde_json::from_value(json).unwrap();
        assert_eq!(back, result);
    }
}
