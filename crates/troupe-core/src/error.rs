//! Error types for registry operations and request-fatal loop failures.
//!
//! Errors local to one capability invocation never appear here: they are
//! folded into the transcript as failed results so the reasoning engine can
//! adapt. Only resolution failures (surfaced to the loop) and
//! request-terminating conditions get real error types.

use crate::capability::CapabilityName;
use crate::reasoning::ReasoningError;
use thiserror::Error;

/// Errors from capability registration and resolution.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A capability with this name is already registered.
    #[error("capability already registered: {0}")]
    DuplicateCapability(CapabilityName),

    /// No capability with this name exists in the registry.
    #[error("capability not found: {0}")]
    UnknownCapability(String),

    /// The capability's descriptor carries an empty description.
    #[error("capability '{0}' has an empty description")]
    MissingDescription(CapabilityName),
}

impl RegistryError {
    /// Stable code for logging and reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            RegistryError::DuplicateCapability(_) => "DUPLICATE_CAPABILITY",
            RegistryError::UnknownCapability(_) => "UNKNOWN_CAPABILITY",
            RegistryError::MissingDescription(_) => "MISSING_DESCRIPTION",
        }
    }
}

/// Conditions that terminate a delegation request.
#[derive(Debug, Error)]
pub enum DelegationError {
    /// The round bound was hit without a final answer. Not retryable.
    #[error("round limit exceeded: {rounds} rounds reached (max {max_rounds})")]
    RoundLimitExceeded { rounds: u32, max_rounds: u32 },

    /// The reasoning engine stayed unavailable through every retry attempt.
    #[error("reasoning engine gave no decision after {attempts} attempts")]
    ReasoningExhausted {
        attempts: u32,
        #[source]
        source: ReasoningError,
    },

    /// One capability failed too many times in a row (configurable cutoff).
    #[error("capability '{capability}' failed {failures} consecutive times")]
    ConsecutiveFailures { capability: String, failures: u32 },

    /// The request was cancelled before completion.
    #[error("request cancelled")]
    Cancelled,
}

impl DelegationError {
    /// Stable code for logging and reporting.
    pub fn error_code(&self) -> &'static str {
        match self {
            DelegationError::RoundLimitExceeded { .. } => "ROUND_LIMIT_EXCEEDED",
            DelegationError::ReasoningExhausted { .. } => "REASONING_EXHAUSTED",
            DelegationError::ConsecutiveFailures { .. } => "CONSECUTIVE_FAILURES",
            DelegationError::Cancelled => "CANCELLED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_error_display() {
        let err = RegistryError::UnknownCapability("weather".to_string());
        assert_eq!(err.to_string(), "capability not found: weather");
        assert_eq!(err.error_code(), "UNKNOWN_CAPABILITY");
    }

    #[test]
    fn delegation_error_codes() {
        let err = DelegationError::RoundLimitExceeded {
            rounds: 9,
            max_rounds: 8,
        };
        assert_eq!(err.error_code(), "ROUND_LIMIT_EXCEEDED");

        let err = DelegationError::ReasoningExhausted {
            attempts: 3,
            source: ReasoningError::Unavailable("503".to_string()),
        };
        assert_eq!(err.error_code(), "REASONING_EXHAUSTED");
        assert!(err.to_string().contains("3 attempts"));

        assert_eq!(DelegationError::Cancelled.error_code(), "CANCELLED");
    }
}
