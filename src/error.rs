use thiserror::Error;

/// Failure categories surfaced by every fallible stage in the pipeline.
///
/// Stages validate their own contracts at entry and fail fast with one of
/// these; the orchestrator never attempts to recover from a previous
/// stage's error, it just stops and returns it.
#[derive(Debug, Error)]
pub enum GenError {
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    #[error("mesh invariant violated: {0}")]
    MeshInvariantViolated(String),

    #[error("value out of the declared rescale range: {0}")]
    RangeError(String),

    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    #[error("poisson sampler refused a pre-seeded point: {0}")]
    AlgorithmStuck(String),
}
