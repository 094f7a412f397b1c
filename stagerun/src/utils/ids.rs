//! UUID generation for runs.

use uuid::Uuid;

/// Generates a random v4 UUID.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a time-ordered v7 UUID for a pipeline run.
///
/// Successive runs sort by creation time, which keeps log output and
/// collected updates easy to correlate.
#[must_use]
pub fn generate_run_id() -> Uuid {
    Uuid::now_v7()
}
