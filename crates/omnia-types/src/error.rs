// ─────────────────────────────────────────────────────────────────────
// Director-Class AI — Omnia Kernel Error Hierarchy
// ─────────────────────────────────────────────────────────────────────

use thiserror::Error;

use crate::record::DroppedRepresentation;

/// Root error type for all Omnia kernel failures.
///
/// Failures are local: one object, one pair, or one metric. Nothing in the
/// kernel turns one of these into a batch-wide abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OmniaError {
    /// Malformed or duplicate representation input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Audit mode regenerated a representation and got different bytes.
    #[error("determinism violation: representation '{representation}' from lens '{lens}' is not reproducible")]
    DeterminismViolation { representation: String, lens: String },

    /// No comparator exists for this pair of payload shapes.
    #[error("unsupported representation pair ({left}, {right}): {reason}")]
    UnsupportedRepresentation {
        left: String,
        right: String,
        reason: String,
    },

    /// Fewer than two mutually comparable representations survived.
    ///
    /// `dropped` lists every representation removed on the way, with its reason.
    #[error("insufficient representations for object '{object}': {viable} viable, need at least 2")]
    InsufficientRepresentations {
        object: String,
        viable: usize,
        dropped: Vec<DroppedRepresentation>,
    },

    /// A metric's preconditions were not met.
    #[error("metric '{metric}' input error: {reason}")]
    MetricInput { metric: String, reason: String },

    /// A lens failed to produce its views.
    #[error("lens '{lens}' generation error: {reason}")]
    LensGeneration { lens: String, reason: String },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Numerical error (NaN/Inf in computation).
    #[error("numerical error: {0}")]
    Numerical(String),
}

impl OmniaError {
    pub fn metric_input(metric: &str, reason: impl Into<String>) -> Self {
        Self::MetricInput {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }

    /// Errors that only remove one pair or representation from an evaluation.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedRepresentation { .. }
                | Self::DeterminismViolation { .. }
                | Self::LensGeneration { .. }
                | Self::MetricInput { .. }
        )
    }
}

pub type OmniaResult<T> = Result<T, OmniaError>;
