//! Error taxonomy for the weaver
//!
//! Parsing-level misses on a single candidate are swallowed by the caller
//! (the remaining candidates proceed); everything that reaches the pipeline
//! boundary is fatal for the whole unit. No partially-instrumented unit is
//! ever emitted.

use thiserror::Error;

/// Errors surfaced by parsing and weaving.
#[derive(Debug, Error)]
pub enum WeaveError {
    /// A required structural element could not be located. Recoverable at
    /// the granularity of "skip this candidate" during multi-candidate
    /// extraction, fatal when nothing was found at all or when required
    /// pipeline input is missing.
    #[error("structural element not found: {0}")]
    StructuralNotFound(&'static str),

    /// A pipeline pass was about to run before one of its declared
    /// dependencies. Always fatal: partially-woven text is unsafe to ship.
    #[error("pass `{pass}` requires `{dependency}` to have run first")]
    DependencyUnmet { pass: String, dependency: String },

    /// The declared pass dependencies form a cycle. A configuration
    /// error, detected before any pass runs.
    #[error("pass dependency cycle involving `{0}`")]
    DependencyCycle(String),

    /// Synthesis could not complete: a missing anchor, or a marker left
    /// unresolved after the final pass.
    #[error("generation failed for `{unit}`: {reason}")]
    Generation { unit: String, reason: String },
}

impl WeaveError {
    /// Convenience constructor for fatal generation errors.
    pub fn generation(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        WeaveError::Generation {
            unit: unit.into(),
            reason: reason.into(),
        }
    }
}
