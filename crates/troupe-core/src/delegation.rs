//! The delegation loop: decide, delegate, fold, repeat.
//!
//! One loop instance serves one user request to completion. Sequencing
//! (search, then extract, then summarize) is never hard-coded here: the
//! reasoning engine re-reads the accumulated transcript each round, so the
//! loop's only responsibilities are state bookkeeping, capability
//! resolution, and bounding runaway chains.

use crate::capability::CapabilityArgs;
use crate::config::LoopConfig;
use crate::error::{DelegationError, RegistryError};
use crate::executor::SpecialistExecutor;
use crate::reasoning::{Decision, ReasoningAdapter, ReasoningError};
use crate::registry::CapabilityRegistry;
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Status of a delegation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopStatus {
    /// The loop is still cycling through decision rounds.
    Running,
    /// A final answer was produced.
    Completed,
    /// The request terminated without a final answer.
    Failed,
    /// The request was cancelled.
    Cancelled,
}

impl LoopStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoopStatus::Running)
    }
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopStatus::Running => write!(f, "running"),
            LoopStatus::Completed => write!(f, "completed"),
            LoopStatus::Failed => write!(f, "failed"),
            LoopStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Per-request loop bookkeeping.
///
/// `round_count` counts resolved delegation rounds (a capability result
/// folded into the transcript) and never exceeds `max_rounds`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopState {
    pub round_count: u32,
    pub max_rounds: u32,
    pub status: LoopStatus,
}

impl LoopState {
    fn new(max_rounds: u32) -> Self {
        Self {
            round_count: 0,
            max_rounds,
            status: LoopStatus::Running,
        }
    }
}

/// Outcome of one delegation request.
///
/// Fatal conditions are reported here rather than thrown: every failure
/// path still assembles a best-effort answer from whatever intermediate
/// results exist, tagged as `partial`.
#[derive(Debug)]
pub struct DelegationReport {
    /// The final answer, or the partial/fallback answer on failure.
    pub answer: String,
    /// Terminal status of the request.
    pub status: LoopStatus,
    /// True unless the answer came from a `FinalAnswer` decision.
    pub partial: bool,
    /// Resolved delegation rounds consumed.
    pub rounds: u32,
    /// The full transcript, for archiving or inspection.
    pub transcript: Transcript,
    /// The terminating condition on failure paths.
    pub failure: Option<DelegationError>,
}

/// The orchestrator's control loop.
///
/// Holds the shared read-only registry and the reasoning adapter; each call
/// to [`run`](Self::run) serves one request with its own transcript and
/// state, so independent requests can run as independent loop instances
/// with no shared mutable state.
pub struct DelegationLoop {
    registry: Arc<CapabilityRegistry>,
    reasoning: Arc<dyn ReasoningAdapter>,
    executor: SpecialistExecutor,
    config: LoopConfig,
}

impl DelegationLoop {
    /// Create a loop over a registry and reasoning adapter with default
    /// configuration.
    pub fn new(registry: Arc<CapabilityRegistry>, reasoning: Arc<dyn ReasoningAdapter>) -> Self {
        let executor = SpecialistExecutor::new(Arc::clone(&registry));
        Self {
            registry,
            reasoning,
            executor,
            config: LoopConfig::default(),
        }
    }

    /// Replace the loop configuration.
    pub fn with_config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Serve one request to completion.
    pub async fn run(&self, goal: impl Into<String>) -> DelegationReport {
        self.run_until_cancelled(goal, CancellationToken::new())
            .await
    }

    /// Serve one request, honoring a cancellation signal.
    ///
    /// The token is observed at the top of every decision round; a
    /// cancelled request terminates with [`LoopStatus::Cancelled`] without
    /// invoking any further capability.
    pub async fn run_until_cancelled(
        &self,
        goal: impl Into<String>,
        cancel: CancellationToken,
    ) -> DelegationReport {
        let mut transcript = Transcript::new(goal);
        let mut state = LoopState::new(self.config.max_rounds);
        let mut failure_streaks: HashMap<String, u32> = HashMap::new();

        info!(
            request_id = %transcript.request_id,
            capabilities = self.registry.len(),
            "starting delegation loop"
        );

        loop {
            if cancel.is_cancelled() {
                warn!(request_id = %transcript.request_id, "request cancelled");
                state.status = LoopStatus::Cancelled;
                return self.finish(transcript, state, DelegationError::Cancelled);
            }

            let decision = match self.decide_with_retry(&transcript).await {
                Ok(decision) => decision,
                Err(err) => {
                    warn!(request_id = %transcript.request_id, error = %err, "reasoning exhausted");
                    state.status = LoopStatus::Failed;
                    return self.finish(transcript, state, err);
                }
            };

            match decision {
                Decision::Answer { text } => {
                    transcript.push_answer(&text);
                    state.status = LoopStatus::Completed;
                    info!(
                        request_id = %transcript.request_id,
                        rounds = state.round_count,
                        "request completed"
                    );
                    return DelegationReport {
                        answer: text,
                        status: LoopStatus::Completed,
                        partial: false,
                        rounds: state.round_count,
                        transcript,
                        failure: None,
                    };
                }
                Decision::Delegate {
                    capability,
                    arguments,
                } => {
                    // Once the bound is reached the engine gets one final
                    // consult; asking for yet another delegation fails the
                    // request, so round_count stays within max_rounds.
                    if state.round_count >= state.max_rounds {
                        warn!(
                            request_id = %transcript.request_id,
                            rounds = state.round_count,
                            "round limit reached, refusing further delegation"
                        );
                        state.status = LoopStatus::Failed;
                        return self.finish(
                            transcript,
                            state,
                            DelegationError::RoundLimitExceeded {
                                rounds: state.round_count,
                                max_rounds: state.max_rounds,
                            },
                        );
                    }

                    debug!(
                        request_id = %transcript.request_id,
                        capability = %capability,
                        round = state.round_count,
                        "delegating"
                    );
                    transcript.push_delegation(&capability, arguments.clone());

                    let (output, success) = self.invoke(&capability, &arguments).await;
                    if !success {
                        warn!(
                            request_id = %transcript.request_id,
                            capability = %capability,
                            output = %output,
                            "capability invocation failed"
                        );
                    }
                    transcript.push_result(&capability, &output, success);
                    state.round_count += 1;

                    if success {
                        failure_streaks.remove(&capability);
                    } else if let Some(limit) = self.config.max_consecutive_failures {
                        let streak = failure_streaks.entry(capability.clone()).or_insert(0);
                        *streak += 1;
                        if *streak >= limit {
                            state.status = LoopStatus::Failed;
                            let failures = *streak;
                            return self.finish(
                                transcript,
                                state,
                                DelegationError::ConsecutiveFailures {
                                    capability,
                                    failures,
                                },
                            );
                        }
                    }
                }
            }
        }
    }

    /// Ask the reasoning engine for the next decision, retrying transient
    /// outages with exponential backoff. A decide timeout counts as an
    /// outage and consumes a retry attempt.
    async fn decide_with_retry(
        &self,
        transcript: &Transcript,
    ) -> Result<Decision, DelegationError> {
        let descriptors = self.registry.describe_all();
        let mut attempt = 0u32;
        loop {
            let outcome = tokio::time::timeout(
                self.config.decide_timeout,
                self.reasoning.decide(transcript, &descriptors),
            )
            .await;

            let err = match outcome {
                Ok(Ok(decision)) => return Ok(decision),
                Ok(Err(err)) => err,
                Err(_) => ReasoningError::Timeout(self.config.decide_timeout),
            };

            attempt += 1;
            if !err.is_retryable() || attempt >= self.config.retry.max_attempts {
                return Err(DelegationError::ReasoningExhausted {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.config.retry.delay_for(attempt - 1);
            warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying decision");
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one capability invocation under the configured deadline,
    /// flattening every failure mode into (output, success) for the
    /// transcript. Unknown names become the synthetic self-correction
    /// result instead of terminating the request.
    async fn invoke(&self, capability: &str, arguments: &CapabilityArgs) -> (String, bool) {
        let invocation = tokio::time::timeout(
            self.config.invoke_timeout,
            self.executor.execute(capability, arguments),
        )
        .await;

        match invocation {
            Err(_) => (
                format!(
                    "timed out: '{capability}' did not finish within {:?}",
                    self.config.invoke_timeout
                ),
                false,
            ),
            Ok(Err(RegistryError::UnknownCapability(name))) => {
                (format!("capability not found: {name}"), false)
            }
            Ok(Err(err)) => (err.to_string(), false),
            Ok(Ok(result)) => {
                let success = result.is_success();
                (result.output(), success)
            }
        }
    }

    /// Assemble the report for a failure or cancellation path: the best
    /// partial answer from the last successful result, else a generic
    /// failure message.
    fn finish(
        &self,
        transcript: Transcript,
        state: LoopState,
        failure: DelegationError,
    ) -> DelegationReport {
        let answer = match transcript.last_successful_result() {
            Some((capability, output)) => format!(
                "The request did not complete; partial results follow.\n\
                 Latest result from '{capability}':\n{output}"
            ),
            None => {
                "The request could not be completed and produced no intermediate results."
                    .to_string()
            }
        };
        DelegationReport {
            answer,
            status: state.status,
            partial: true,
            rounds: state.round_count,
            transcript,
            failure: Some(failure),
        }
    }
}
