//! Scripted reasoning adapter: replays a fixed sequence of decisions so
//! delegation-loop behavior can be asserted deterministically.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use troupe_core::{
    CapabilityArgs, CapabilityDescriptor, Decision, ReasoningAdapter, ReasoningError, Transcript,
};

/// A reasoning adapter that pops one scripted outcome per `decide` call.
///
/// Every transcript handed to `decide` is recorded (cloned), so tests can
/// assert exactly what the engine saw at each round, in particular that
/// step N's result was visible to decision N+1. When the script runs dry
/// the adapter answers with a fixed marker rather than erroring, keeping
/// misconfigured tests loud but bounded.
pub struct ScriptedReasoner {
    script: Mutex<VecDeque<Result<Decision, ReasoningError>>>,
    generate_replies: Mutex<VecDeque<Result<String, ReasoningError>>>,
    decide_calls: AtomicU32,
    generate_calls: AtomicU32,
    transcripts: Mutex<Vec<Transcript>>,
}

impl Default for ScriptedReasoner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedReasoner {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            generate_replies: Mutex::new(VecDeque::new()),
            decide_calls: AtomicU32::new(0),
            generate_calls: AtomicU32::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a delegation decision.
    pub fn with_delegation(self, capability: impl Into<String>, arguments: CapabilityArgs) -> Self {
        self.push_decision(Ok(Decision::delegate(capability, arguments)));
        self
    }

    /// Queue a final-answer decision.
    pub fn with_answer(self, text: impl Into<String>) -> Self {
        self.push_decision(Ok(Decision::answer(text)));
        self
    }

    /// Queue a transient outage.
    pub fn with_outage(self, message: impl Into<String>) -> Self {
        self.push_decision(Err(ReasoningError::Unavailable(message.into())));
        self
    }

    /// Queue a reply for the next `generate` call.
    pub fn with_generated(self, text: impl Into<String>) -> Self {
        self.generate_replies
            .lock()
            .expect("generate lock")
            .push_back(Ok(text.into()));
        self
    }

    fn push_decision(&self, outcome: Result<Decision, ReasoningError>) {
        self.script.lock().expect("script lock").push_back(outcome);
    }

    /// Number of `decide` calls so far.
    pub fn decide_calls(&self) -> u32 {
        self.decide_calls.load(Ordering::SeqCst)
    }

    /// Number of `generate` calls so far.
    pub fn generate_calls(&self) -> u32 {
        self.generate_calls.load(Ordering::SeqCst)
    }

    /// The transcripts observed by each `decide` call, in order.
    pub fn transcripts_seen(&self) -> Vec<Transcript> {
        self.transcripts.lock().expect("transcripts lock").clone()
    }
}

#[async_trait]
impl ReasoningAdapter for ScriptedReasoner {
    async fn decide(
        &self,
        transcript: &Transcript,
        _capabilities: &[&CapabilityDescriptor],
    ) -> Result<Decision, ReasoningError> {
        self.decide_calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts
            .lock()
            .expect("transcripts lock")
            .push(transcript.clone());
        self.script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Ok(Decision::answer("scripted reasoner: script exhausted")))
    }

    async fn generate(&self, _instruction: &str, input: &str) -> Result<String, ReasoningError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.generate_replies
            .lock()
            .expect("generate lock")
            .pop_front()
            .unwrap_or_else(|| Ok(format!("scripted summary of: {input}")))
    }
}
