//! Stage status enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle status of one stage within a run.
///
/// The only legal transitions are `Idle -> Running` and
/// `Running -> Completed | Failed`. Returning to `Idle` happens only through
/// a whole-pipeline reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage has not started in the current run.
    #[default]
    Idle,
    /// Stage is currently executing.
    Running,
    /// Stage produced its output.
    Completed,
    /// Stage failed; later stages were not run.
    Failed,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns true if the status indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if a run may move a stage from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running) | (Self::Running, Self::Completed | Self::Failed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_status_display() {
        assert_eq!(StageStatus::Idle.to_string(), "idle");
        assert_eq!(StageStatus::Running.to_string(), "running");
        assert_eq!(StageStatus::Completed.to_string(), "completed");
        assert_eq!(StageStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_stage_status_default_is_idle() {
        assert_eq!(StageStatus::default(), StageStatus::Idle);
    }

    #[test]
    fn test_stage_status_is_terminal() {
        assert!(StageStatus::Completed.is_terminal());
        assert!(StageStatus::Failed.is_terminal());
        assert!(!StageStatus::Idle.is_terminal());
        assert!(!StageStatus::Running.is_terminal());
    }

    #[test]
    fn test_legal_transitions() {
        assert!(StageStatus::Idle.can_transition_to(StageStatus::Running));
        assert!(StageStatus::Running.can_transition_to(StageStatus::Completed));
        assert!(StageStatus::Running.can_transition_to(StageStatus::Failed));

        assert!(!StageStatus::Idle.can_transition_to(StageStatus::Completed));
        assert!(!StageStatus::Completed.can_transition_to(StageStatus::Running));
        assert!(!StageStatus::Failed.can_transition_to(StageStatus::Completed));
        assert!(!StageStatus::Running.can_transition_to(StageStatus::Running));
    }

    #[test]
    fn test_stage_status_serialize() {
        let json = serde_json::to_string(&StageStatus::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let deserialized: StageStatus = serde_json::from_str(r#""failed""#).unwrap();
        assert_eq!(deserialized, StageStatus::Failed);
    }
}
