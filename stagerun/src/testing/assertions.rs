//! Test assertions for run snapshots and observed transitions.

use crate::core::{PipelineRun, StageStatus, StageUpdate};

/// Asserts that the stage at `index` has the expected status.
pub fn assert_stage_status(run: &PipelineRun, index: usize, expected: StageStatus) {
    let actual = run.get(index).map(|r| r.status);
    assert_eq!(
        actual,
        Some(expected),
        "Expected stage {index} to be {expected:?}, got {actual:?}"
    );
}

/// Asserts that every stage completed and the run is no longer busy.
pub fn assert_run_completed(run: &PipelineRun) {
    assert!(
        run.is_complete(),
        "Expected all stages to complete, got {:?}",
        run.statuses()
    );
    assert!(!run.busy, "Expected the run to be finished");
}

/// Asserts that the run stopped at `index`: earlier stages completed, the
/// stage itself failed and every later stage is still idle.
pub fn assert_failed_at(run: &PipelineRun, index: usize) {
    for (i, result) in run.results.iter().enumerate() {
        let expected = match i.cmp(&index) {
            std::cmp::Ordering::Less => StageStatus::Completed,
            std::cmp::Ordering::Equal => StageStatus::Failed,
            std::cmp::Ordering::Greater => StageStatus::Idle,
        };
        assert_eq!(
            result.status, expected,
            "Stage {i} ('{}') should be {expected:?} when stage {index} fails",
            result.name
        );
    }
    assert!(!run.busy, "Expected the run to be finished");
}

/// Asserts that observed updates follow the strict left-to-right protocol.
///
/// Each stage, in index order, reports `Running` followed by one terminal
/// status, no stage is reported out of order, and nothing follows a failure.
/// At most `stage_count` stages may appear.
pub fn assert_left_to_right(updates: &[StageUpdate], stage_count: usize) {
    assert!(
        updates.len() % 2 == 0,
        "Expected Running/terminal pairs, got {} updates",
        updates.len()
    );

    for (expected_index, pair) in updates.chunks(2).enumerate() {
        let (start, end) = (&pair[0], &pair[1]);
        assert!(
            expected_index < stage_count,
            "Update for stage {} exceeds stage count {stage_count}",
            start.index
        );
        assert_eq!(start.index, expected_index, "Stage started out of order");
        assert_eq!(start.status(), StageStatus::Running);
        assert_eq!(end.index, expected_index, "Stage finished out of order");
        assert!(
            end.status().is_terminal(),
            "Stage {expected_index} ended in non-terminal {:?}",
            end.status()
        );
        if end.status() == StageStatus::Failed {
            assert_eq!(
                (expected_index + 1) * 2,
                updates.len(),
                "Updates continued after stage {expected_index} failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageResult;
    use crate::utils::now_utc;

    fn update(index: usize, status: StageStatus) -> StageUpdate {
        let mut result = StageResult::idle(format!("s{index}"));
        result.start(now_utc());
        match status {
            StageStatus::Completed => result.complete("ok".into(), now_utc()),
            StageStatus::Failed => result.fail("no".into()),
            _ => {}
        }
        StageUpdate::new(None, index, result)
    }

    #[test]
    fn test_left_to_right_accepts_valid_sequence() {
        let updates = vec![
            update(0, StageStatus::Running),
            update(0, StageStatus::Completed),
            update(1, StageStatus::Running),
            update(1, StageStatus::Failed),
        ];
        assert_left_to_right(&updates, 3);
    }

    #[test]
    #[should_panic(expected = "out of order")]
    fn test_left_to_right_rejects_skipped_stage() {
        let updates = vec![update(1, StageStatus::Running), update(1, StageStatus::Completed)];
        assert_left_to_right(&updates, 3);
    }

    #[test]
    fn test_failed_at_on_snapshot() {
        let mut run = PipelineRun::new("p", ["a", "b", "c"]);
        run.results[0].start(now_utc());
        run.results[0].complete("x".into(), now_utc());
        run.results[1].start(now_utc());
        run.results[1].fail("boom".into());

        assert_failed_at(&run, 1);
        assert_stage_status(&run, 2, StageStatus::Idle);
    }
}
