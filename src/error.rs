//! Error types for spec compilation and solving.

use thiserror::Error;

/// Main error type for compile/solve operations.
///
/// Validation problems are reported in-band by [`crate::validate::validate`]
/// and never surface here. An infeasible model is not an error either; the
/// solver driver reports it as a `no_solution` outcome.
#[derive(Debug, Error)]
pub enum SolveError {
    /// A required key was absent at compile time (e.g. a demand entry
    /// referencing a day that is not in the planning horizon).
    #[error("missing field: {0}")]
    SpecMissingField(String),

    /// A value violates the DSL grammar (unsupported constraint kind,
    /// non-work shift in a forbidden pair, unsupported window mode, ...).
    #[error("invalid value: {0}")]
    SpecInvalidValue(String),

    /// Unexpected failure: backend error or arithmetic overflow.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias for compile/solve operations.
pub type Result<T> = std::result::Result<T, SolveError>;
