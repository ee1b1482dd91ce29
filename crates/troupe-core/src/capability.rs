//! Capability contract: descriptors, argument schemas, and the invocation
//! result type shared between the delegation loop and specialist providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Maximum length of a capability name in characters.
const MAX_NAME_LEN: usize = 64;

/// Validated capability identifier.
///
/// Names route delegation requests to providers, so they are validated once
/// at construction: non-empty, at most 64 characters, and limited to
/// alphanumerics, underscores, and dashes. The reasoning engine may still
/// emit arbitrary strings as capability names; those stay as plain `String`
/// until resolution (see [`crate::registry::CapabilityRegistry::resolve`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CapabilityName(String);

impl CapabilityName {
    /// Parse and validate a capability name.
    pub fn parse(name: &str) -> Result<Self, InvalidCapabilityName> {
        if name.trim().is_empty() {
            return Err(InvalidCapabilityName::Empty);
        }
        if name.len() > MAX_NAME_LEN {
            return Err(InvalidCapabilityName::TooLong {
                length: name.len(),
                max: MAX_NAME_LEN,
            });
        }
        if let Some(ch) = name
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '_' && *c != '-')
        {
            return Err(InvalidCapabilityName::InvalidCharacter(ch));
        }
        Ok(Self(name.to_string()))
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CapabilityName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for CapabilityName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        CapabilityName::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Errors produced when validating a capability name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidCapabilityName {
    #[error("capability name must not be empty")]
    Empty,
    #[error("capability name is {length} characters, max is {max}")]
    TooLong { length: usize, max: usize },
    #[error("capability name contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Semantic type of a declared capability parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Integer,
    Number,
    Boolean,
}

impl ParamKind {
    /// JSON Schema type name for this kind.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }

    /// Check whether a JSON value satisfies this kind.
    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// A single declared parameter of a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name as the reasoning engine must supply it.
    pub name: String,
    /// Expected value kind.
    pub kind: ParamKind,
    /// Natural-language description shown to the reasoning engine.
    pub description: String,
    /// Whether the parameter must be present in every invocation.
    pub required: bool,
}

impl ParamSpec {
    /// Create a required parameter.
    pub fn required(
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: true,
        }
    }

    /// Create an optional parameter.
    pub fn optional(
        name: impl Into<String>,
        kind: ParamKind,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            required: false,
        }
    }
}

/// Ordered parameter schema for one capability.
///
/// Declaration order is preserved; it is the order parameters appear in the
/// JSON Schema handed to the reasoning engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputSchema {
    params: Vec<ParamSpec>,
}

impl InputSchema {
    /// Create an empty schema (a capability taking no arguments).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, preserving declaration order.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Declared parameters in declaration order.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Render as a JSON Schema object for the reasoning-engine boundary.
    pub fn to_json_schema(&self) -> serde_json::Value {
        let properties: serde_json::Map<String, serde_json::Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    serde_json::json!({
                        "type": p.kind.json_type(),
                        "description": p.description,
                    }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Validate supplied arguments against the declared parameters.
    ///
    /// Returns one message per violation: a missing required parameter or a
    /// declared parameter supplied with the wrong kind. Undeclared extras
    /// are passed through untouched; providers own their semantics.
    pub fn violations(&self, args: &CapabilityArgs) -> Vec<String> {
        let mut issues = Vec::new();
        for param in &self.params {
            match args.get(&param.name) {
                None if param.required => {
                    issues.push(format!("missing required parameter '{}'", param.name));
                }
                Some(value) if !param.kind.accepts(value) => {
                    issues.push(format!(
                        "parameter '{}' expects {}",
                        param.name,
                        param.kind.json_type()
                    ));
                }
                _ => {}
            }
        }
        issues
    }
}

/// Named arguments supplied with one capability invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityArgs(serde_json::Map<String, serde_json::Value>);

impl CapabilityArgs {
    /// Create an empty argument map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build arguments from a JSON value; non-object values yield an empty
    /// map, matching the tolerant decoding of tool-call payloads.
    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(map) => Self(map),
            _ => Self::default(),
        }
    }

    /// Insert an argument, replacing any previous value under the name.
    pub fn insert(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.0.insert(name.into(), value);
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Get a raw argument value.
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    /// Get a string argument.
    pub fn str_arg(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.as_str())
    }

    /// Get an integer argument.
    pub fn int_arg(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(|v| v.as_i64())
    }

    /// Get a boolean argument.
    pub fn bool_arg(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(|v| v.as_bool())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// View as the underlying JSON object.
    pub fn as_json(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }
}

/// Static description of one capability: identity, selection text, and the
/// declared argument schema.
///
/// The description carries all the signal the reasoning engine has for
/// selection, so registries reject empty ones at registration time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDescriptor {
    pub name: CapabilityName,
    pub description: String,
    pub input_schema: InputSchema,
}

impl CapabilityDescriptor {
    /// Create a descriptor with an empty schema.
    pub fn new(name: CapabilityName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            input_schema: InputSchema::new(),
        }
    }

    /// Attach the parameter schema.
    pub fn with_schema(mut self, schema: InputSchema) -> Self {
        self.input_schema = schema;
        self
    }
}

/// Structured reason for a failed capability invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureReason {
    /// Arguments did not satisfy the declared schema.
    InvalidArguments { message: String },
    /// A referenced resource (URL, document) could not be found.
    NotFound { resource: String },
    /// Transport-level failure reaching the provider.
    Network { message: String },
    /// The invocation exceeded its deadline.
    Timeout { operation: String },
    /// The provider itself reported a failure.
    Provider { message: String },
    /// Unexpected internal failure.
    Internal { message: String },
}

impl FailureReason {
    /// Human-readable message, used as the failed result's output text.
    pub fn message(&self) -> String {
        match self {
            FailureReason::InvalidArguments { message } => format!("invalid arguments: {message}"),
            FailureReason::NotFound { resource } => format!("not found: {resource}"),
            FailureReason::Network { message } => format!("network error: {message}"),
            FailureReason::Timeout { operation } => format!("timed out: {operation}"),
            FailureReason::Provider { message } => format!("provider error: {message}"),
            FailureReason::Internal { message } => format!("internal error: {message}"),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// The result of one capability invocation.
///
/// Providers must not raise control-flow errors across this boundary: every
/// failure is a `Failure` variant with an explanatory reason, so the
/// delegation loop can fold it into the transcript and let the reasoning
/// engine adapt.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    /// The capability produced output.
    Success { output: String },
    /// The capability failed with a structured reason.
    Failure { reason: FailureReason },
}

impl InvocationResult {
    /// Create a successful result.
    pub fn success(output: impl Into<String>) -> Self {
        InvocationResult::Success {
            output: output.into(),
        }
    }

    /// Create a failed result with a structured reason.
    pub fn failed(reason: FailureReason) -> Self {
        InvocationResult::Failure { reason }
    }

    /// Create a failed result from a plain message.
    pub fn failure(message: impl Into<String>) -> Self {
        InvocationResult::Failure {
            reason: FailureReason::Provider {
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InvocationResult::Success { .. })
    }

    /// Output text for success, reason message for failure.
    pub fn output(&self) -> String {
        match self {
            InvocationResult::Success { output } => output.clone(),
            InvocationResult::Failure { reason } => reason.message(),
        }
    }

    /// The success output, if any.
    pub fn success_output(&self) -> Option<&str> {
        match self {
            InvocationResult::Success { output } => Some(output),
            InvocationResult::Failure { .. } => None,
        }
    }

    /// The failure reason, if any.
    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            InvocationResult::Success { .. } => None,
            InvocationResult::Failure { reason } => Some(reason),
        }
    }
}

/// A specialist capability the delegation loop can invoke.
///
/// Implementations are created at startup, immutable thereafter, and shared
/// read-only across requests as [`CapabilityHandle`]s. An invocation is
/// single-shot: it returns exactly one result and never re-enters the
/// delegation loop, which keeps every delegation round terminating
/// regardless of what a specialist does internally.
#[async_trait]
pub trait Capability: Send + Sync {
    /// The static descriptor: name, selection text, argument schema.
    fn descriptor(&self) -> &CapabilityDescriptor;

    /// Invoke the capability with validated named arguments.
    async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult;
}

/// Shared handle binding a descriptor to its invocation function.
pub type CapabilityHandle = Arc<dyn Capability>;

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoCapability {
        descriptor: CapabilityDescriptor,
    }

    impl EchoCapability {
        fn new() -> Self {
            let name = CapabilityName::parse("echo").expect("valid name");
            Self {
                descriptor: CapabilityDescriptor::new(name, "Echoes its input back.").with_schema(
                    InputSchema::new().with_param(ParamSpec::required(
                        "text",
                        ParamKind::String,
                        "Text to echo",
                    )),
                ),
            }
        }
    }

    #[async_trait]
    impl Capability for EchoCapability {
        fn descriptor(&self) -> &CapabilityDescriptor {
            &self.descriptor
        }

        async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult {
            match args.str_arg("text") {
                Some(text) => InvocationResult::success(format!("echo: {text}")),
                None => InvocationResult::failed(FailureReason::InvalidArguments {
                    message: "missing 'text'".to_string(),
                }),
            }
        }
    }

    #[test]
    fn name_validation_rules() {
        assert!(CapabilityName::parse("web_search").is_ok());
        assert!(CapabilityName::parse("page-extract").is_ok());
        assert!(CapabilityName::parse("Summarize2").is_ok());

        assert_eq!(
            CapabilityName::parse(""),
            Err(InvalidCapabilityName::Empty)
        );
        assert_eq!(
            CapabilityName::parse("   "),
            Err(InvalidCapabilityName::Empty)
        );
        assert!(matches!(
            CapabilityName::parse("has space"),
            Err(InvalidCapabilityName::InvalidCharacter(' '))
        ));
        assert!(matches!(
            CapabilityName::parse(&"x".repeat(65)),
            Err(InvalidCapabilityName::TooLong { .. })
        ));
    }

    #[test]
    fn schema_preserves_declaration_order() {
        let schema = InputSchema::new()
            .with_param(ParamSpec::required("query", ParamKind::String, "The query"))
            .with_param(ParamSpec::optional(
                "max_results",
                ParamKind::Integer,
                "Result cap",
            ));

        let names: Vec<&str> = schema.params().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["query", "max_results"]);

        let json = schema.to_json_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["required"], serde_json::json!(["query"]));
        assert_eq!(json["properties"]["query"]["type"], "string");
    }

    #[test]
    fn schema_flags_missing_and_mistyped_arguments() {
        let schema = InputSchema::new()
            .with_param(ParamSpec::required("url", ParamKind::String, "Page URL"))
            .with_param(ParamSpec::optional(
                "max_chars",
                ParamKind::Integer,
                "Truncation limit",
            ));

        let missing = schema.violations(&CapabilityArgs::new());
        assert_eq!(missing, vec!["missing required parameter 'url'"]);

        let mistyped = CapabilityArgs::new()
            .with("url", serde_json::json!("https://example.com"))
            .with("max_chars", serde_json::json!("lots"));
        assert_eq!(
            schema.violations(&mistyped),
            vec!["parameter 'max_chars' expects integer"]
        );

        let extra = CapabilityArgs::new()
            .with("url", serde_json::json!("https://example.com"))
            .with("unexpected", serde_json::json!(true));
        assert!(schema.violations(&extra).is_empty());
    }

    #[test]
    fn args_from_non_object_value_is_empty() {
        let args = CapabilityArgs::from_value(serde_json::json!("just a string"));
        assert!(args.is_empty());

        let args = CapabilityArgs::from_value(serde_json::json!({"query": "rust"}));
        assert_eq!(args.str_arg("query"), Some("rust"));
    }

    #[tokio::test]
    async fn capability_invocation_round_trip() {
        let capability = EchoCapability::new();
        let args = CapabilityArgs::new().with("text", serde_json::json!("hello"));

        let result = capability.invoke(&args).await;
        assert!(result.is_success());
        assert_eq!(result.output(), "echo: hello");

        let failed = capability.invoke(&CapabilityArgs::new()).await;
        assert!(!failed.is_success());
        assert!(failed.output().contains("invalid arguments"));
    }

    #[test]
    fn failure_reason_messages() {
        let reason = FailureReason::Timeout {
            operation: "web_search".to_string(),
        };
        assert_eq!(reason.message(), "timed out: web_search");
        assert_eq!(
            InvocationResult::failed(reason.clone()).failure_reason(),
            Some(&reason)
        );
    }
}
