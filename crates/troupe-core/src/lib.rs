//! # Troupe Core
//!
//! Core contracts and the delegation loop for the troupe coordination
//! runtime: route a natural-language goal to one of several specialist
//! capabilities, invoke it, fold the result back into the transcript, and
//! repeat until the reasoning engine judges the goal satisfied.
//!
//! ## Core Components
//!
//! - **[Capability]**: a named specialist with a selection description and
//!   declared argument schema, invoked as a [`CapabilityHandle`]
//! - **[CapabilityRegistry]**: ordered, immutable-after-startup collection
//!   of capabilities, resolved by name
//! - **[ReasoningAdapter]**: the external decision engine, consulted each
//!   round and returning a closed [`Decision`]
//! - **[SpecialistExecutor]**: argument validation plus single-shot
//!   dispatch, including the [`ReasonedCapability`] wrapper for
//!   specialists that are themselves one reasoning call
//! - **[DelegationLoop]**: the per-request state machine that owns the
//!   [`Transcript`], bounds runaway chains, and always returns a
//!   [`DelegationReport`]
//!
//! Multi-step behavior (search, then extract, then summarize) is emergent:
//! the loop has no built-in knowledge of what comes after what, and the
//! reasoning engine re-reads the whole transcript every round.

pub mod capability;
pub mod config;
pub mod delegation;
pub mod error;
pub mod executor;
pub mod reasoning;
pub mod registry;
pub mod transcript;

pub use capability::{
    Capability, CapabilityArgs, CapabilityDescriptor, CapabilityHandle, CapabilityName,
    FailureReason, InputSchema, InvalidCapabilityName, InvocationResult, ParamKind, ParamSpec,
};
pub use config::{LoopConfig, RetryPolicy};
pub use delegation::{DelegationLoop, DelegationReport, LoopState, LoopStatus};
pub use error::{DelegationError, RegistryError};
pub use executor::{ReasonedCapability, SpecialistExecutor};
pub use reasoning::{Decision, ReasoningAdapter, ReasoningError};
pub use registry::CapabilityRegistry;
pub use transcript::{Transcript, Turn};
