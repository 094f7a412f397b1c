//! Observability utilities.

mod subscriber;

pub use subscriber::{init_tracing, run_span, LogFormat};
