//! # Troupe
//!
//! Troupe routes a natural-language request to a troupe of specialist
//! capabilities (web search, page extraction, summarization, or your own)
//! and folds their outputs back into one coherent answer. There is no
//! hand-written branching over sub-task combinations: an external
//! reasoning engine re-reads the accumulated transcript each round and
//! either delegates to one capability or produces the final answer.
//!
//! ## Core Components
//!
//! - **[Capability]**: one named specialist with a natural-language
//!   description used for selection and a declared argument schema
//! - **[CapabilityRegistry]**: the ordered, read-only set of capabilities
//!   a loop can delegate to
//! - **[ReasoningAdapter]**: the decision engine boundary; ships with an
//!   OpenAI-compatible implementation in [`reasoning`]
//! - **[DelegationLoop]**: the per-request state machine with round
//!   bounds, per-call timeouts, retry with backoff, and cancellation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use troupe::{DelegationLoop, LoopConfig};
//! use troupe::capabilities::{SearchConfig, research_registry};
//! use troupe::reasoning::{ChatReasoner, ChatReasonerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let reasoner: Arc<ChatReasoner> = Arc::new(ChatReasoner::new(
//!     ChatReasonerConfig::default().with_api_key("sk-..."),
//! )?);
//!
//! let registry = Arc::new(research_registry(
//!     SearchConfig::new("https://api.tavily.com/search", "tvly-..."),
//!     reasoner.clone(),
//! ));
//!
//! let delegation = DelegationLoop::new(registry, reasoner)
//!     .with_config(LoopConfig::default().with_max_rounds(6));
//!
//! let report = delegation
//!     .run("Find out what ADK is and summarize it in two sentences")
//!     .await;
//! println!("{}", report.answer);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Module aliases for namespaced access
// ============================================================================

pub use troupe_core as core;

#[cfg(feature = "capabilities")]
pub use troupe_capabilities as capabilities;
#[cfg(feature = "reasoning")]
pub use troupe_reasoning as reasoning;
#[cfg(feature = "testing")]
pub use troupe_testing as testing;

// ============================================================================
// Core types - capabilities, transcript, loop
// ============================================================================

pub use troupe_core::{
    Capability, CapabilityArgs, CapabilityDescriptor, CapabilityHandle, CapabilityName,
    CapabilityRegistry, Decision, DelegationError, DelegationLoop, DelegationReport,
    FailureReason, InputSchema, InvalidCapabilityName, InvocationResult, LoopConfig, LoopState,
    LoopStatus, ParamKind, ParamSpec, ReasonedCapability, ReasoningAdapter, ReasoningError,
    RegistryError, RetryPolicy, SpecialistExecutor, Transcript, Turn,
};
