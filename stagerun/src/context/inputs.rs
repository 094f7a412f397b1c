//! Ordered outputs of previously completed stages.

use serde::{Deserialize, Serialize};

/// The output of one stage that completed earlier in the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorOutput {
    /// Stage name.
    pub stage: String,
    /// Text the stage produced.
    pub output: String,
}

/// An immutable, ordered view of prior stage outputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInputs {
    outputs: Vec<PriorOutput>,
}

impl StageInputs {
    /// Creates an empty set of inputs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with one more completed output appended.
    #[must_use]
    pub fn with_output(mut self, stage: impl Into<String>, output: impl Into<String>) -> Self {
        self.push(stage, output);
        self
    }

    pub(crate) fn push(&mut self, stage: impl Into<String>, output: impl Into<String>) {
        self.outputs.push(PriorOutput {
            stage: stage.into(),
            output: output.into(),
        });
    }

    /// Gets the output of a specific stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&str> {
        self.outputs
            .iter()
            .find(|p| p.stage == stage)
            .map(|p| p.output.as_str())
    }

    /// Checks if output exists for a stage.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.outputs.iter().any(|p| p.stage == stage)
    }

    /// The most recently completed output.
    #[must_use]
    pub fn latest(&self) -> Option<&PriorOutput> {
        self.outputs.last()
    }

    /// Returns all prior outputs in completion order.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, PriorOutput> {
        self.outputs.iter()
    }

    /// Returns the stage names in completion order.
    #[must_use]
    pub fn stages(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.stage.as_str()).collect()
    }

    /// Returns the number of prior outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Returns true if no stage has completed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl<'a> IntoIterator for &'a StageInputs {
    type Item = &'a PriorOutput;
    type IntoIter = std::slice::Iter<'a, PriorOutput>;

    fn into_iter(self) -> Self::IntoIter {
        self.outputs.iter()
    }
}
