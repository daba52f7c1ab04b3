//! Resilient event pipeline — retry with exponential backoff behind a
//! circuit breaker, dispatched off the display path. Ad display never
//! depends on ad telemetry succeeding.

pub mod breaker;
pub mod pipeline;
pub mod retry;

pub use breaker::CircuitBreaker;
pub use pipeline::{AlwaysOnline, ConnectivityProbe, EventPipeline, ReportOutcome};
pub use retry::RetryPolicy;
