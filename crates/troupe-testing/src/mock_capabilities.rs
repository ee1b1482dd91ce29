//! Mock capability implementations that return predictable responses,
//! allowing controlled delegation-loop scenarios in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use troupe_core::{
    Capability, CapabilityArgs, CapabilityDescriptor, CapabilityHandle, CapabilityName,
    InvocationResult, ParamSpec,
};

/// A mock capability that returns predefined results keyed on one of its
/// arguments.
///
/// The first declared parameter becomes the response key; invocations with
/// an unmatched (or absent) key fall back to the default response. Call
/// counts and full argument history are recorded for assertions.
#[derive(Clone)]
pub struct MockCapability {
    descriptor: CapabilityDescriptor,
    key_param: Option<String>,
    responses: HashMap<String, InvocationResult>,
    default_response: Option<InvocationResult>,
    calls: Arc<Mutex<Vec<CapabilityArgs>>>,
}

impl MockCapability {
    /// Create a mock capability with an empty schema.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid capability name; mocks are built
    /// from literals in tests.
    pub fn new(name: &str, description: impl Into<String>) -> Self {
        let name = CapabilityName::parse(name).expect("valid mock capability name");
        Self {
            descriptor: CapabilityDescriptor::new(name, description),
            key_param: None,
            responses: HashMap::new(),
            default_response: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Declare a parameter. The first declared parameter keys responses.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        if self.key_param.is_none() {
            self.key_param = Some(param.name.clone());
        }
        self.descriptor.input_schema = self.descriptor.input_schema.clone().with_param(param);
        self
    }

    /// Add a successful response for a specific key value.
    pub fn with_response(mut self, key: impl Into<String>, output: impl Into<String>) -> Self {
        self.responses
            .insert(key.into(), InvocationResult::success(output.into()));
        self
    }

    /// Add a failed response for a specific key value.
    pub fn with_failure(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.responses
            .insert(key.into(), InvocationResult::failure(message.into()));
        self
    }

    /// Set the response used when no key matches.
    pub fn with_default_response(mut self, output: impl Into<String>) -> Self {
        self.default_response = Some(InvocationResult::success(output.into()));
        self
    }

    /// Set a failure as the response used when no key matches.
    pub fn with_default_failure(mut self, message: impl Into<String>) -> Self {
        self.default_response = Some(InvocationResult::failure(message.into()));
        self
    }

    /// Wrap into a registrable handle.
    pub fn into_handle(self) -> CapabilityHandle {
        Arc::new(self)
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("call history lock").len()
    }

    /// Arguments of every invocation, in order.
    pub fn call_history(&self) -> Vec<CapabilityArgs> {
        self.calls.lock().expect("call history lock").clone()
    }

    /// Whether any invocation carried the given key value.
    pub fn was_called_with(&self, key: &str) -> bool {
        let Some(param) = &self.key_param else {
            return false;
        };
        self.calls
            .lock()
            .expect("call history lock")
            .iter()
            .any(|args| args.str_arg(param) == Some(key))
    }
}

#[async_trait]
impl Capability for MockCapability {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult {
        self.calls
            .lock()
            .expect("call history lock")
            .push(args.clone());

        let keyed = self
            .key_param
            .as_ref()
            .and_then(|p| args.str_arg(p))
            .and_then(|key| self.responses.get(key));

        match keyed.or(self.default_response.as_ref()) {
            Some(result) => result.clone(),
            None => InvocationResult::success(format!(
                "mock response from {}",
                self.descriptor.name
            )),
        }
    }
}
