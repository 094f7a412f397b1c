//! Per-stage execution context.

use super::StageInputs;
use std::sync::Arc;
use uuid::Uuid;

/// Everything a stage may read: its position, the run's initial input and
/// the outputs of the stages that completed before it.
#[derive(Debug, Clone)]
pub struct StageContext {
    run_id: Option<Uuid>,
    index: usize,
    stage_name: String,
    initial_input: Arc<str>,
    inputs: StageInputs,
}

impl StageContext {
    /// Creates a new stage context.
    #[must_use]
    pub fn new(
        index: usize,
        stage_name: impl Into<String>,
        initial_input: impl Into<Arc<str>>,
        inputs: StageInputs,
    ) -> Self {
        Self {
            run_id: None,
            index,
            stage_name: stage_name.into(),
            initial_input: initial_input.into(),
            inputs,
        }
    }

    /// Attaches the run identifier.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// The run this stage belongs to.
    #[must_use]
    pub fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// Position of this stage in the pipeline.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Name of this stage.
    #[must_use]
    pub fn stage_name(&self) -> &str {
        &self.stage_name
    }

    /// The input the run was started with.
    #[must_use]
    pub fn initial_input(&self) -> &str {
        &self.initial_input
    }

    /// Outputs of previously completed stages.
    #[must_use]
    pub fn inputs(&self) -> &StageInputs {
        &self.inputs
    }

    /// Output of a named prior stage.
    #[must_use]
    pub fn output_of(&self, stage: &str) -> Option<&str> {
        self.inputs.get(stage)
    }

    /// Output of the stage that ran immediately before this one.
    #[must_use]
    pub fn latest_output(&self) -> Option<&str> {
        self.inputs.latest().map(|p| p.output.as_str())
    }

    /// The latest output, or the initial input for the first stage.
    #[must_use]
    pub fn previous_or_initial(&self) -> &str {
        self.latest_output().unwrap_or(&self.initial_input)
    }

    /// Renders `"Label: output"` lines for the given `(label, stage)` pairs.
    ///
    /// Stages that have not produced output are left out.
    #[must_use]
    pub fn labeled(&self, pairs: &[(&str, &str)]) -> String {
        pairs
            .iter()
            .filter_map(|(label, stage)| {
                self.inputs
                    .get(stage)
                    .map(|output| format!("{label}: {output}"))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders every prior output as `"stage: output"` lines.
    #[must_use]
    pub fn history(&self) -> String {
        self.inputs
            .iter()
            .map(|p| format!("{}: {}", p.stage, p.output))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
