//! Request transcript: the ordered history of one delegation request,
//! consulted afresh by the reasoning engine every round.

use crate::capability::CapabilityArgs;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in a request transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    /// The user's goal (or a follow-up message).
    UserMessage {
        text: String,
        timestamp: DateTime<Utc>,
    },
    /// The orchestrator chose to invoke a capability.
    DelegationRequest {
        capability: String,
        arguments: CapabilityArgs,
        timestamp: DateTime<Utc>,
    },
    /// The outcome of the most recent delegation request.
    CapabilityResult {
        capability: String,
        output: String,
        success: bool,
        timestamp: DateTime<Utc>,
    },
    /// The final answer produced for the user.
    FinalAnswer {
        text: String,
        timestamp: DateTime<Utc>,
    },
}

impl Turn {
    /// Create a user message turn.
    pub fn user(text: impl Into<String>) -> Self {
        Turn::UserMessage {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a delegation request turn.
    pub fn delegation(capability: impl Into<String>, arguments: CapabilityArgs) -> Self {
        Turn::DelegationRequest {
            capability: capability.into(),
            arguments,
            timestamp: Utc::now(),
        }
    }

    /// Create a capability result turn.
    pub fn result(capability: impl Into<String>, output: impl Into<String>, success: bool) -> Self {
        Turn::CapabilityResult {
            capability: capability.into(),
            output: output.into(),
            success,
            timestamp: Utc::now(),
        }
    }

    /// Create a final answer turn.
    pub fn answer(text: impl Into<String>) -> Self {
        Turn::FinalAnswer {
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Ordered sequence of turns for one request.
///
/// Owned and mutated exclusively by the delegation loop for the lifetime of
/// the request; returned to the caller (archivable via serde) once a
/// terminal state is reached. A `DelegationRequest` is always followed by
/// exactly one `CapabilityResult` before the reasoning engine is consulted
/// again; the append helpers assert that pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    /// Unique id of the request this transcript belongs to.
    pub request_id: String,
    turns: Vec<Turn>,
}

impl Transcript {
    /// Start a transcript from the user's goal.
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            turns: vec![Turn::user(goal)],
        }
    }

    /// All turns in order.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The original user goal.
    pub fn goal(&self) -> &str {
        match self.turns.first() {
            Some(Turn::UserMessage { text, .. }) => text,
            _ => "",
        }
    }

    /// Whether the last turn is an unresolved delegation request.
    pub fn pending_delegation(&self) -> bool {
        matches!(self.turns.last(), Some(Turn::DelegationRequest { .. }))
    }

    /// Append a delegation request.
    pub fn push_delegation(&mut self, capability: impl Into<String>, arguments: CapabilityArgs) {
        debug_assert!(
            !self.pending_delegation(),
            "previous delegation has no result yet"
        );
        self.turns.push(Turn::delegation(capability, arguments));
    }

    /// Append the result resolving the pending delegation request.
    pub fn push_result(
        &mut self,
        capability: impl Into<String>,
        output: impl Into<String>,
        success: bool,
    ) {
        debug_assert!(self.pending_delegation(), "no pending delegation request");
        self.turns.push(Turn::result(capability, output, success));
    }

    /// Append the final answer.
    pub fn push_answer(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::answer(text));
    }

    /// The final answer, if one was produced.
    pub fn final_answer(&self) -> Option<&str> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::FinalAnswer { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of resolved delegation rounds (capability results).
    pub fn result_count(&self) -> usize {
        self.turns
            .iter()
            .filter(|t| matches!(t, Turn::CapabilityResult { .. }))
            .count()
    }

    /// The most recent successful capability result, as (capability, output).
    ///
    /// This is what failure paths assemble a best-effort partial answer
    /// from.
    pub fn last_successful_result(&self) -> Option<(&str, &str)> {
        self.turns.iter().rev().find_map(|t| match t {
            Turn::CapabilityResult {
                capability,
                output,
                success: true,
                ..
            } => Some((capability.as_str(), output.as_str())),
            _ => None,
        })
    }
}
