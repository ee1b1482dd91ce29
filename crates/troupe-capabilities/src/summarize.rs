//! Summarization capability: a single reasoning call with a fixed
//! instruction, no external tools.

use std::sync::Arc;
use troupe_core::{
    CapabilityDescriptor, CapabilityName, InputSchema, ParamKind, ParamSpec, ReasonedCapability,
    ReasoningAdapter,
};

/// Registered name of the summarization capability.
pub const SUMMARIZE_CAPABILITY: &str = "summarize";

/// Fixed instruction for the summarization reasoning step.
const SUMMARIZER_INSTRUCTION: &str = "\
Produce a clear, concise, and accurate summary of the text you are given. \
The summary must be significantly shorter than the original while \
retaining its core message. Stay neutral and add nothing that is not in \
the original. Reply with only the summary, without introductions or \
closings.";

/// Build the summarization capability over a reasoning adapter.
///
/// The capability performs exactly one reasoning call per invocation;
/// failures from that call come back as failed results, never as errors.
pub fn summarizer(reasoning: Arc<dyn ReasoningAdapter>) -> ReasonedCapability {
    let name = CapabilityName::parse(SUMMARIZE_CAPABILITY).expect("static name is valid");
    let descriptor = CapabilityDescriptor::new(
        name,
        "Produces a concise summary of supplied text, such as content \
         gathered by earlier search or extraction steps. Provide the full \
         text to be summarized.",
    )
    .with_schema(InputSchema::new().with_param(ParamSpec::required(
        "text",
        ParamKind::String,
        "The text to summarize",
    )));

    ReasonedCapability::new(descriptor, SUMMARIZER_INSTRUCTION, "text", reasoning)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use troupe_core::{
        Capability, CapabilityArgs, Decision, ReasoningError, Transcript,
    };

    struct RecordingReasoner {
        instructions: std::sync::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ReasoningAdapter for RecordingReasoner {
        async fn decide(
            &self,
            _transcript: &Transcript,
            _capabilities: &[&CapabilityDescriptor],
        ) -> Result<Decision, ReasoningError> {
            Ok(Decision::answer("unused"))
        }

        async fn generate(
            &self,
            instruction: &str,
            input: &str,
        ) -> Result<String, ReasoningError> {
            self.instructions
                .lock()
                .expect("lock")
                .push(instruction.to_string());
            Ok(format!("summary: {}", &input[..input.len().min(20)]))
        }
    }

    #[tokio::test]
    async fn summarizer_uses_the_fixed_instruction() {
        let reasoning = Arc::new(RecordingReasoner {
            instructions: std::sync::Mutex::new(Vec::new()),
        });
        let capability = summarizer(reasoning.clone());

        assert_eq!(capability.descriptor().name.as_str(), "summarize");

        let args = CapabilityArgs::new().with("text", json!("ADK is a toolkit."));
        let result = capability.invoke(&args).await;
        assert_eq!(result.success_output(), Some("summary: ADK is a toolkit."));

        let instructions = reasoning.instructions.lock().expect("lock");
        assert_eq!(instructions.len(), 1);
        assert!(instructions[0].contains("only the summary"));
    }
}
