//! Error types for sizing, aggregation and configuration.

use thiserror::Error;

/// Convenience alias for results produced by the sizing core.
pub type Result<T> = std::result::Result<T, CalcError>;

/// Errors raised by a single `compute*` call.
///
/// Every variant is local to one call: nothing is retried and no partial
/// result exists. Zero penalties are not errors (see
/// [`crate::penalty::PenaltyEstimate::roi_years`]).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    /// Out-of-domain numeric input (negative energy, zero months, ...).
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput {
        /// Name of the offending field.
        field: &'static str,
        /// Constraint that was violated.
        reason: String,
    },
    /// A required field is absent and the policy forbids defaulting it.
    #[error("missing input `{field}`")]
    MissingInput {
        /// Name of the absent field.
        field: &'static str,
    },
    /// Aggregation received no usable per-invoice records.
    #[error("no usable invoice records ({failed} of {attempted} failed)")]
    NoValidRecords {
        /// Records (or extraction outcomes) supplied by the caller.
        attempted: usize,
        /// How many of those were skipped as unusable.
        failed: usize,
    },
    /// The device catalog cannot be built.
    #[error("catalog error: {0}")]
    Catalog(String),
    /// The margin tier table cannot be built.
    #[error("margin table error: {0}")]
    Margin(String),
}

impl CalcError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"sizing.hours_per_month"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
