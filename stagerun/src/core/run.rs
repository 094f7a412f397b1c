//! The full observable state of one pipeline execution.

use super::{StageResult, StageStatus};
use crate::errors::StageFailure;
use crate::utils::{elapsed_ms, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ordered stage results for one run, plus the busy flag.
///
/// `results` always has one entry per configured stage, in stage order.
/// While a run is in flight the results form a prefix of `Completed`
/// stages, at most one `Running` or `Failed` stage, then `Idle` stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    /// Name of the pipeline that produced this run.
    pub pipeline: String,
    /// Identifier of the current run; `None` before the first run or after a reset.
    pub run_id: Option<Uuid>,
    /// One result per stage, in execution order.
    pub results: Vec<StageResult>,
    /// Whether a run is in flight.
    pub busy: bool,
    /// When the run started.
    pub started_at: Option<Timestamp>,
    /// When the run finished or aborted.
    pub finished_at: Option<Timestamp>,
    /// Set when the run stopped early because of cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
}

impl PipelineRun {
    /// Creates an idle run for the given stage names.
    #[must_use]
    pub fn new<I, S>(pipeline: impl Into<String>, stage_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pipeline: pipeline.into(),
            run_id: None,
            results: stage_names.into_iter().map(StageResult::idle).collect(),
            busy: false,
            started_at: None,
            finished_at: None,
            cancel_reason: None,
        }
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if the run has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns the result at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&StageResult> {
        self.results.get(index)
    }

    /// Returns the result for the named stage.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Returns the status of every stage, in order.
    #[must_use]
    pub fn statuses(&self) -> Vec<StageStatus> {
        self.results.iter().map(|r| r.status).collect()
    }

    /// Index of the stage currently running.
    #[must_use]
    pub fn running_index(&self) -> Option<usize> {
        self.results.iter().position(StageResult::is_running)
    }

    /// The failed stage, if the run aborted on a failure.
    #[must_use]
    pub fn failed_stage(&self) -> Option<(usize, &StageResult)> {
        self.results.iter().enumerate().find(|(_, r)| r.is_failed())
    }

    /// Rebuilds the recorded failure as an error value.
    #[must_use]
    pub fn failure(&self) -> Option<StageFailure> {
        self.failed_stage().map(|(index, result)| {
            StageFailure::new(index, &result.name, result.message().unwrap_or_default())
        })
    }

    /// Number of completed stages.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    /// Returns true if every stage completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(StageResult::is_completed)
    }

    /// Returns true if the run stopped because of cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel_reason.is_some()
    }

    /// Completed outputs as `(stage name, output)` pairs, in stage order.
    #[must_use]
    pub fn outputs(&self) -> Vec<(&str, &str)> {
        self.results
            .iter()
            .filter(|r| r.is_completed())
            .map(|r| (r.name.as_str(), r.output.as_str()))
            .collect()
    }

    /// Output of the named stage, if it completed.
    #[must_use]
    pub fn output_of(&self, name: &str) -> Option<&str> {
        self.stage(name)
            .filter(|r| r.is_completed())
            .map(|r| r.output.as_str())
    }

    /// Output of the last stage, if the whole run completed.
    #[must_use]
    pub fn final_output(&self) -> Option<&str> {
        if self.is_complete() {
            self.results.last().map(|r| r.output.as_str())
        } else {
            None
        }
    }

    /// All completed outputs joined into one labelled document.
    #[must_use]
    pub fn combined_output(&self) -> String {
        self.outputs()
            .iter()
            .map(|(name, output)| format!("## {name}\n{output}"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Wall-clock duration of the run, once finished.
    #[must_use]
    pub fn duration_ms(&self) -> Option<f64> {
        match (&self.started_at, &self.finished_at) {
            (Some(start), Some(end)) => Some(elapsed_ms(start, end)),
            _ => None,
        }
    }

    /// Checks the ordering invariant.
    ///
    /// # Errors
    ///
    /// Returns a description of the first violation found.
    pub fn check_invariants(&self) -> Result<(), String> {
        let mut iter = self.results.iter().enumerate().skip_while(|(_, r)| r.is_completed());

        // The first non-completed stage may be running, failed or idle; all
        // stages after it must be idle.
        if let Some((index, result)) = iter.next() {
            for (later, r) in iter {
                if !r.is_idle() {
                    return Err(format!(
                        "stage {later} is {} after stage {index} ({})",
                        r.status, result.status
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns every stage to idle and clears run metadata.
    pub(crate) fn reset_all(&mut self) {
        for result in &mut self.results {
            result.reset();
        }
        self.run_id = None;
        self.started_at = None;
        self.finished_at = None;
        self.cancel_reason = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_utc;
    use pretty_assertions::assert_eq;

    fn three_stage_run() -> PipelineRun {
        PipelineRun::new("test", ["a", "b", "c"])
    }

    #[test]
    fn test_new_run_is_idle() {
        let run = three_stage_run();
        assert_eq!(run.len(), 3);
        assert!(!run.busy);
        assert_eq!(run.statuses(), vec![StageStatus::Idle; 3]);
        assert!(run.running_index().is_none());
        assert!(run.check_invariants().is_ok());
    }

    #[test]
    fn test_partial_progress_queries() {
        let mut run = three_stage_run();
        run.results[0].start(now_utc());
        run.results[0].complete("first".to_string(), now_utc());
        run.results[1].start(now_utc());

        assert_eq!(run.running_index(), Some(1));
        assert_eq!(run.completed_count(), 1);
        assert_eq!(run.outputs(), vec![("a", "first")]);
        assert_eq!(run.output_of("a"), Some("first"));
        assert_eq!(run.output_of("b"), None);
        assert!(run.final_output().is_none());
        assert!(run.check_invariants().is_ok());
    }

    #[test]
    fn test_failure_reconstruction() {
        let mut run = three_stage_run();
        run.results[0].start(now_utc());
        run.results[0].fail("boom".to_string());

        let failure = run.failure().unwrap();
        assert_eq!(failure.index, 0);
        assert_eq!(failure.stage, "a");
        assert_eq!(failure.message, "boom");
        assert!(run.check_invariants().is_ok());
    }

    #[test]
    fn test_complete_run_outputs() {
        let mut run = three_stage_run();
        for (i, result) in run.results.iter_mut().enumerate() {
            result.start(now_utc());
            result.complete(format!("out{i}"), now_utc());
        }

        assert!(run.is_complete());
        assert_eq!(run.final_output(), Some("out2"));
        assert_eq!(run.combined_output(), "## a\nout0\n\n## b\nout1\n\n## c\nout2");
    }

    #[test]
    fn test_invariant_violations_detected() {
        let mut run = three_stage_run();
        run.results[0].start(now_utc());
        run.results[2].start(now_utc());
        assert!(run.check_invariants().is_err());

        let mut run = three_stage_run();
        run.results[1].start(now_utc());
        run.results[1].complete("skipped ahead".to_string(), now_utc());
        assert!(run.check_invariants().is_err());
    }

    #[test]
    fn test_reset_all() {
        let mut run = three_stage_run();
        run.run_id = Some(Uuid::now_v7());
        run.started_at = Some(now_utc());
        run.cancel_reason = Some("stop".to_string());
        run.results[0].start(now_utc());
        run.results[0].complete("x".to_string(), now_utc());

        run.reset_all();

        assert_eq!(run, three_stage_run());
    }
}
