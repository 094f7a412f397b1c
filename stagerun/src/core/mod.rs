//! Core data model.
//!
//! - [`StageStatus`]: the four-state lifecycle of a stage
//! - [`StageResult`]: status, output and timing of one stage
//! - [`PipelineRun`]: every stage result of one execution plus the busy flag
//! - [`StageUpdate`]: the message observers receive on each transition

mod result;
mod run;
mod status;
mod update;

pub use result::StageResult;
pub use run::PipelineRun;
pub use status::StageStatus;
pub use update::StageUpdate;
