//! Five-stage complaint-resolution pipeline.
//!
//! Each stage is a [`GenerativeStage`] whose prompt is composed from the
//! complaints text and the outputs of selected earlier stages:
//!
//! | Stage         | Sees                                          |
//! |---------------|-----------------------------------------------|
//! | `categorizer` | complaints                                    |
//! | `prioritizer` | complaints, categorizer                       |
//! | `drafter`     | complaints, prioritizer                       |
//! | `planner`     | complaints, drafter, prioritizer              |
//! | `evaluator`   | categorizer, prioritizer, drafter, planner    |

mod prompts;
mod summary;

pub use prompts::{HIGH_PRIORITY_HEADER, URGENCY_HEADER};
pub use summary::ResolutionSummary;

use crate::errors::ConfigurationError;
use crate::generation::{GenerationConfig, GenerativeStage, TextGenerator};
use crate::pipeline::{PipelineBuilder, PipelineRunner};
use std::sync::Arc;

/// Pipeline name used for logs and snapshots.
pub const PIPELINE_NAME: &str = "complaint-resolution";

/// Assigns a category per complaint.
pub const CATEGORIZER: &str = "categorizer";
/// Ranks urgency.
pub const PRIORITIZER: &str = "prioritizer";
/// Drafts replies.
pub const DRAFTER: &str = "drafter";
/// Recommends follow-up actions.
pub const PLANNER: &str = "planner";
/// Re-evaluates urgency and tracks open high-priority complaints.
pub const EVALUATOR: &str = "evaluator";

/// Stage names in execution order.
pub const STAGE_NAMES: [&str; 5] = [CATEGORIZER, PRIORITIZER, DRAFTER, PLANNER, EVALUATOR];

/// Thinking budget for the final evaluation stage.
/// Re-evaluates urgency and tracks open high-priority complaints.
pub const EVALUATOR_THINKING_BUDGET: u32 = 8000;

/// Builds the five generative stages sharing one generator.
///
/// `config` applies to every stage; the evaluator's thinking budget is
/// raised to [`EVALUATOR_THINKING_BUDGET`].
pub fn resolution_stages(
    generator: &Arc<dyn TextGenerator>,
    config: &GenerationConfig,
) -> Vec<GenerativeStage> {
    let categorizer = GenerativeStage::new(CATEGORIZER, generator.clone(), |ctx| {
        prompts::categorizer_prompt(ctx.initial_input())
    });

    let prioritizer = GenerativeStage::new(PRIORITIZER, generator.clone(), |ctx| {
        prompts::prioritizer_prompt(
            ctx.initial_input(),
            ctx.output_of(CATEGORIZER).unwrap_or_default(),
        )
    });

    let drafter = GenerativeStage::new(DRAFTER, generator.clone(), |ctx| {
        prompts::drafter_prompt(
            ctx.initial_input(),
            ctx.output_of(PRIORITIZER).unwrap_or_default(),
        )
    });

    let planner = GenerativeStage::new(PLANNER, generator.clone(), |ctx| {
        prompts::planner_prompt(
            ctx.initial_input(),
            ctx.output_of(DRAFTER).unwrap_or_default(),
            ctx.output_of(PRIORITIZER).unwrap_or_default(),
        )
    });

    let evaluator = GenerativeStage::new(EVALUATOR, generator.clone(), |ctx| {
        prompts::evaluator_prompt(&ctx.labeled(&[
            ("Categorization", CATEGORIZER),
            ("Priorities", PRIORITIZER),
            ("Drafts", DRAFTER),
            ("Actions", PLANNER),
        ]))
    })
    .with_config(
        config
            .clone()
            .with_thinking_budget(EVALUATOR_THINKING_BUDGET),
    );

    vec![
        categorizer.with_config(config.clone()),
        prioritizer.with_config(config.clone()),
        drafter.with_config(config.clone()),
        planner.with_config(config.clone()),
        evaluator,
    ]
}

/// Assembles the complaint-resolution pipeline.
///
/// # Errors
///
/// Only fails if the stage list were invalid, which the fixed names rule out
/// in practice.
pub fn complaint_resolution_pipeline(
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
) -> Result<PipelineRunner, ConfigurationError> {
    resolution_stages(&generator, &config)
        .into_iter()
        .fold(PipelineBuilder::new(PIPELINE_NAME), |builder, stage| {
            builder.stage(stage)
        })
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageStatus;
    use crate::testing::ScriptedGenerator;
    use pretty_assertions::assert_eq;

    const COMPLAINTS: &str = "COMP-001: charged twice\nCOMP-002: app crashes on login";

    fn scripted() -> Arc<ScriptedGenerator> {
        Arc::new(
            ScriptedGenerator::new()
                .respond("CATEGORIZATION:\nCOMP-001 → Billing")
                .respond("PRIORITIZATION:\nCOMP-001 → Critical")
                .respond("RESPONSE_TEMPLATES:\nCOMP-001 →\nSorry about the double charge.")
                .respond("RECOMMENDED_ACTIONS:\nCOMP-001 → refund within 24h")
                .respond(
                    "URGENCY_REEVALUATION:\nCOMP-001 → Unchanged, refund pending\n\n\
                     HIGH_PRIORITY_STATE:\n- Complaint ID: COMP-001\n  Category: Billing",
                ),
        )
    }

    #[test]
    fn test_stage_order_and_evaluator_budget() {
        let generator: Arc<dyn TextGenerator> = scripted();
        let stages = resolution_stages(&generator, &GenerationConfig::default());

        let names: Vec<&str> = stages.iter().map(|s| crate::stages::Stage::name(s)).collect();
        assert_eq!(names, STAGE_NAMES.to_vec());
        assert_eq!(stages[0].config().thinking_budget, 4000);
        assert_eq!(stages[4].config().thinking_budget, EVALUATOR_THINKING_BUDGET);
    }

    #[tokio::test]
    async fn test_full_resolution_run() {
        let generator = scripted();
        let runner =
            complaint_resolution_pipeline(generator.clone(), GenerationConfig::default()).unwrap();

        let run = runner.run(COMPLAINTS).await.unwrap();
        assert!(run.is_complete());

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 5);
        assert!(prompts[0].contains("charged twice"));
        // prioritizer sees the categorization
        assert!(prompts[1].contains("COMP-001 → Billing"));
        // drafter sees priorities but not the categorization
        assert!(prompts[2].contains("COMP-001 → Critical"));
        assert!(!prompts[2].contains("COMP-001 → Billing"));
        // planner sees drafts and priorities
        assert!(prompts[3].contains("Sorry about the double charge."));
        assert!(prompts[3].contains("COMP-001 → Critical"));
        // evaluator sees every labelled phase
        assert!(prompts[4].contains("Categorization: CATEGORIZATION:"));
        assert!(prompts[4].contains("Actions: RECOMMENDED_ACTIONS:"));

        let summary = ResolutionSummary::from_run(&run).unwrap();
        assert_eq!(summary.critical_ids, vec!["COMP-001".to_string()]);
        assert!(summary.urgency_reevaluation.starts_with("COMP-001 → Unchanged"));
    }

    #[tokio::test]
    async fn test_backend_failure_stops_the_run() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("CATEGORIZATION: ok")
                .fail(crate::generation::GenerationError::Quota(
                    "quota exceeded".into(),
                )),
        );
        let runner =
            complaint_resolution_pipeline(generator.clone(), GenerationConfig::default()).unwrap();

        let run = runner.run(COMPLAINTS).await.unwrap();
        assert_eq!(
            run.statuses(),
            vec![
                StageStatus::Completed,
                StageStatus::Failed,
                StageStatus::Idle,
                StageStatus::Idle,
                StageStatus::Idle,
            ]
        );
        assert!(run.get(1).unwrap().message().unwrap().contains("quota exceeded"));
        assert_eq!(generator.prompts().len(), 2);
        assert!(ResolutionSummary::from_run(&run).is_none());
    }
}
