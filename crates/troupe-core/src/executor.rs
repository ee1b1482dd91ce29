//! Specialist execution contexts: argument validation plus dispatch for
//! direct providers, and the single-shot reasoning wrapper for specialists
//! that are themselves one reasoning call.

use crate::capability::{
    Capability, CapabilityArgs, CapabilityDescriptor, FailureReason, InvocationResult,
};
use crate::error::RegistryError;
use crate::reasoning::ReasoningAdapter;
use crate::registry::CapabilityRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Thin per-capability execution context used by the delegation loop.
///
/// Resolution failures propagate to the caller (the loop turns them into a
/// self-correction turn); schema violations do not: they come back as a
/// failed [`InvocationResult`] so the reasoning engine can fix its
/// arguments on the next round.
#[derive(Clone)]
pub struct SpecialistExecutor {
    registry: Arc<CapabilityRegistry>,
}

impl SpecialistExecutor {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    /// Validate arguments and run exactly one invocation of the named
    /// capability.
    pub async fn execute(
        &self,
        capability: &str,
        args: &CapabilityArgs,
    ) -> Result<InvocationResult, RegistryError> {
        let handle = self.registry.resolve(capability)?;

        let violations = handle.descriptor().input_schema.violations(args);
        if !violations.is_empty() {
            debug!(capability, ?violations, "rejecting invocation arguments");
            return Ok(InvocationResult::failed(FailureReason::InvalidArguments {
                message: violations.join("; "),
            }));
        }

        debug!(capability, args = %args.as_json(), "invoking capability");
        Ok(handle.invoke(args).await)
    }
}

/// A capability whose behavior is a single reasoning-engine call with a
/// fixed instruction.
///
/// The wrapper extracts the declared text parameter, performs exactly one
/// [`generate`](ReasoningAdapter::generate) call, and maps any failure to a
/// failed result with a diagnostic message. It never re-enters the
/// delegation loop, so each delegation round terminates no matter what the
/// reasoning engine does.
pub struct ReasonedCapability {
    descriptor: CapabilityDescriptor,
    instruction: String,
    input_param: String,
    reasoning: Arc<dyn ReasoningAdapter>,
}

impl ReasonedCapability {
    /// Create a reasoning-backed capability.
    ///
    /// `input_param` names the schema parameter whose value is handed to
    /// the reasoning engine along with `instruction`.
    pub fn new(
        descriptor: CapabilityDescriptor,
        instruction: impl Into<String>,
        input_param: impl Into<String>,
        reasoning: Arc<dyn ReasoningAdapter>,
    ) -> Self {
        let input_param = input_param.into();
        debug_assert!(
            descriptor
                .input_schema
                .params()
                .iter()
                .any(|p| p.name == input_param),
            "input parameter '{input_param}' is not declared in the schema"
        );
        Self {
            descriptor,
            instruction: instruction.into(),
            input_param,
            reasoning,
        }
    }
}

#[async_trait]
impl Capability for ReasonedCapability {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult {
        let Some(input) = args.str_arg(&self.input_param) else {
            return InvocationResult::failed(FailureReason::InvalidArguments {
                message: format!("missing required parameter '{}'", self.input_param),
            });
        };

        match self.reasoning.generate(&self.instruction, input).await {
            Ok(output) if !output.trim().is_empty() => InvocationResult::success(output),
            Ok(_) => InvocationResult::failed(FailureReason::Provider {
                message: "reasoning engine produced empty output".to_string(),
            }),
            Err(err) => InvocationResult::failed(FailureReason::Provider {
                message: format!("reasoning step failed: {err}"),
            }),
        }
    }
}
