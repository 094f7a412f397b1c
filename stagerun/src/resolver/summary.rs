//! Parsing of the evaluator's final report.

use super::prompts::{HIGH_PRIORITY_HEADER, URGENCY_HEADER};
use super::EVALUATOR;
use crate::core::PipelineRun;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const NO_CRITICAL_STATE: &str = "No critical states logged.";

fn complaint_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\bCOMP-\d+\b").expect("valid complaint id pattern"))
}

/// The evaluator's report split into its two sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    /// Updated urgency per complaint, without its header.
    pub urgency_reevaluation: String,
    /// Complaints still needing attention, or a placeholder if none were listed.
    pub high_priority_state: String,
    /// Complaint ids mentioned in the high-priority section, first mention first.
    pub critical_ids: Vec<String>,
}

impl ResolutionSummary {
    /// Splits an evaluator report on [`HIGH_PRIORITY_HEADER`].
    #[must_use]
    pub fn parse(report: &str) -> Self {
        let (urgency, state) = match report.split_once(HIGH_PRIORITY_HEADER) {
            Some((before, after)) => (before, Some(after.trim())),
            None => (report, None),
        };

        let urgency_reevaluation = urgency.replacen(URGENCY_HEADER, "", 1).trim().to_string();
        let high_priority_state = match state {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => NO_CRITICAL_STATE.to_string(),
        };

        let mut critical_ids: Vec<String> = Vec::new();
        for id in complaint_id_pattern().find_iter(&high_priority_state) {
            if !critical_ids.iter().any(|seen| seen == id.as_str()) {
                critical_ids.push(id.as_str().to_string());
            }
        }

        Self {
            urgency_reevaluation,
            high_priority_state,
            critical_ids,
        }
    }

    /// Parses the evaluator output of a finished run.
    ///
    /// Returns `None` unless the evaluator stage completed.
    #[must_use]
    pub fn from_run(run: &PipelineRun) -> Option<Self> {
        run.stage(EVALUATOR)
            .filter(|result| result.is_completed())
            .map(|result| Self::parse(&result.output))
    }

    /// Returns true if no complaint is still flagged.
    #[must_use]
    pub fn is_clear(&self) -> bool {
        self.critical_ids.is_empty()
    }
}
