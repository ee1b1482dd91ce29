//! Reasoning-engine boundary: the decision type and the adapter trait the
//! delegation loop (and reasoning-backed specialists) consult.

use crate::capability::{CapabilityArgs, CapabilityDescriptor};
use crate::transcript::Transcript;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the reasoning engine wants to happen next.
///
/// Modeled as a closed tagged union rather than a dispatched method call so
/// the decision surface stays exhaustively matchable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke the named capability with the given arguments.
    ///
    /// The capability name is free text at this point: the engine may name
    /// something that does not exist, and resolution failure feeds the
    /// loop's self-correction path instead of being unrepresentable.
    Delegate {
        capability: String,
        arguments: CapabilityArgs,
    },
    /// The goal is satisfied; answer the user.
    Answer { text: String },
}

impl Decision {
    /// Create a delegation decision.
    pub fn delegate(capability: impl Into<String>, arguments: CapabilityArgs) -> Self {
        Decision::Delegate {
            capability: capability.into(),
            arguments,
        }
    }

    /// Create a final-answer decision.
    pub fn answer(text: impl Into<String>) -> Self {
        Decision::Answer { text: text.into() }
    }
}

/// Errors surfaced by a reasoning adapter.
#[derive(Debug, Error)]
pub enum ReasoningError {
    /// Transport/provider outage. Retried (with backoff) by the delegation
    /// loop, never by the adapter itself.
    #[error("reasoning engine unavailable: {0}")]
    Unavailable(String),

    /// The engine replied, but with something the adapter cannot turn into
    /// a decision.
    #[error("reasoning engine returned an unusable response: {0}")]
    InvalidResponse(String),

    /// The call exceeded its deadline.
    #[error("reasoning call timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ReasoningError {
    /// Whether the delegation loop should retry the call.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReasoningError::Unavailable(_) | ReasoningError::Timeout(_)
        )
    }
}

/// Uniform interface to the reasoning engine.
///
/// Adapters are pure functions of the supplied transcript and descriptors
/// (modulo the engine's own non-determinism, which callers must tolerate):
/// they hold no conversational state between calls.
///
/// Preconditions for [`decide`](ReasoningAdapter::decide): the transcript
/// contains at least the initial user goal, and `capabilities` is
/// non-empty.
#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    /// Given the transcript so far and the available capabilities, return
    /// either a final answer or a request to invoke one capability.
    async fn decide(
        &self,
        transcript: &Transcript,
        capabilities: &[&CapabilityDescriptor],
    ) -> Result<Decision, ReasoningError>;

    /// One-round completion with a fixed instruction, used by specialists
    /// that are themselves a single reasoning step (e.g. summarization).
    async fn generate(&self, instruction: &str, input: &str) -> Result<String, ReasoningError>;
}
