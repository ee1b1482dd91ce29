//! OpenAI-compatible chat-completions implementation of the reasoning
//! adapter.
//!
//! The transcript is rendered as role-tagged messages (capability results
//! as `tool` entries), the capability descriptors as function-calling tool
//! definitions. A response carrying tool calls becomes a delegation
//! decision; plain content becomes the final answer.

use async_trait::async_trait;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use troupe_core::{
    CapabilityArgs, CapabilityDescriptor, Decision, ReasoningAdapter, ReasoningError, Transcript,
    Turn,
};

/// Instruction prepended to every decision round.
const COORDINATOR_INSTRUCTION: &str = "\
You coordinate a team of specialist capabilities to fulfil the user's \
request. Each round, either call exactly one capability that moves the \
request forward, or reply with the final answer. Build on results already \
in the conversation instead of repeating work. If a call fails, adjust the \
arguments or choose a different capability; give up gracefully when no \
capability can help. Your final reply must address the original request \
directly and integrate the specialists' outputs rather than forwarding \
them raw.";

/// Configuration for a [`ChatReasoner`].
#[derive(Debug, Clone)]
pub struct ChatReasonerConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Bearer token; omitted from requests when empty.
    pub api_key: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// Completion token budget.
    pub max_tokens: u32,
    /// Whole-request timeout for the HTTP client.
    pub timeout: Duration,
}

impl Default for ChatReasonerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            max_tokens: 4096,
            timeout: Duration::from_secs(120),
        }
    }
}

impl ChatReasonerConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Errors building a [`ChatReasoner`].
#[derive(Debug, thiserror::Error)]
pub enum ChatSetupError {
    #[error("invalid API key format: {0}")]
    InvalidApiKey(String),
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: ChatFunction,
}

#[derive(Debug, Clone, Serialize)]
struct ChatFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatToolCall {
    id: String,
    #[serde(rename = "type")]
    call_type: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatErrorResponse {
    error: ChatErrorBody,
}

#[derive(Debug, Deserialize)]
struct ChatErrorBody {
    message: String,
}

/// Reasoning adapter backed by an OpenAI-compatible chat-completions
/// endpoint.
///
/// The adapter keeps no conversational state: every call re-sends the
/// supplied transcript. Transport failures surface as
/// [`ReasoningError::Unavailable`]; the delegation loop owns the retry
/// policy.
pub struct ChatReasoner {
    client: Client,
    config: ChatReasonerConfig,
}

impl ChatReasoner {
    /// Build a reasoner from configuration.
    pub fn new(config: ChatReasonerConfig) -> Result<Self, ChatSetupError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if !config.api_key.is_empty() {
            let auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_key))
                .map_err(|e| ChatSetupError::InvalidApiKey(e.to_string()))?;
            headers.insert(header::AUTHORIZATION, auth);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatSetupError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Render the transcript as role-tagged chat messages.
    ///
    /// Delegation requests become assistant tool-call messages with
    /// deterministic ids; each capability result becomes the matching
    /// `tool` message.
    fn render_transcript(transcript: &Transcript) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(transcript.len() + 1);
        let mut call_index = 0usize;
        let mut open_call_id: Option<String> = None;

        for turn in transcript.turns() {
            match turn {
                Turn::UserMessage { text, .. } => {
                    messages.push(ChatMessage::text("user", text));
                }
                Turn::DelegationRequest {
                    capability,
                    arguments,
                    ..
                } => {
                    let id = format!("call_{call_index}");
                    call_index += 1;
                    open_call_id = Some(id.clone());
                    messages.push(ChatMessage {
                        role: "assistant".to_string(),
                        // Some providers require the content field even
                        // when the message only carries tool calls.
                        content: Some(String::new()),
                        tool_calls: Some(vec![ChatToolCall {
                            id,
                            call_type: "function".to_string(),
                            function: ChatFunctionCall {
                                name: capability.clone(),
                                arguments: arguments.as_json().to_string(),
                            },
                        }]),
                        tool_call_id: None,
                    });
                }
                Turn::CapabilityResult {
                    output, success, ..
                } => {
                    let content = if *success {
                        output.clone()
                    } else {
                        format!("ERROR: {output}")
                    };
                    messages.push(ChatMessage {
                        role: "tool".to_string(),
                        content: Some(content),
                        tool_calls: None,
                        tool_call_id: open_call_id.take(),
                    });
                }
                Turn::FinalAnswer { text, .. } => {
                    messages.push(ChatMessage::text("assistant", text));
                }
            }
        }
        messages
    }

    /// Render capability descriptors as function-calling tool definitions.
    fn render_tools(capabilities: &[&CapabilityDescriptor]) -> Vec<ChatTool> {
        capabilities
            .iter()
            .map(|d| ChatTool {
                tool_type: "function".to_string(),
                function: ChatFunction {
                    name: d.name.as_str().to_string(),
                    description: d.description.clone(),
                    parameters: d.input_schema.to_json_schema(),
                },
            })
            .collect()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponseMessage, ReasoningError> {
        debug!(
            endpoint = %self.config.endpoint,
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.as_ref().map(|t| t.len()).unwrap_or(0),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ReasoningError::Timeout(self.config.timeout)
                } else {
                    ReasoningError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ChatErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ReasoningError::Unavailable(format!(
                "endpoint returned {status}: {message}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ReasoningError::Unavailable(e.to_string()))?;
        let decoded: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ReasoningError::InvalidResponse(format!("{e} in: {body}")))?;

        decoded
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| ReasoningError::InvalidResponse("response had no choices".to_string()))
    }
}

#[async_trait]
impl ReasoningAdapter for ChatReasoner {
    async fn decide(
        &self,
        transcript: &Transcript,
        capabilities: &[&CapabilityDescriptor],
    ) -> Result<Decision, ReasoningError> {
        let mut messages = vec![ChatMessage::text("system", COORDINATOR_INSTRUCTION)];
        messages.extend(Self::render_transcript(transcript));

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            tools: Some(Self::render_tools(capabilities)),
            tool_choice: Some("auto".to_string()),
        };

        let message = self.complete(&request).await?;

        if let Some(call) = message.tool_calls.unwrap_or_default().into_iter().next() {
            // Malformed argument payloads degrade to an empty map; the
            // executor's schema validation reports what is missing.
            let arguments = serde_json::from_str::<Value>(&call.function.arguments)
                .map(CapabilityArgs::from_value)
                .unwrap_or_default();
            debug!(capability = %call.function.name, "engine chose to delegate");
            return Ok(Decision::delegate(call.function.name, arguments));
        }

        match message.content {
            Some(text) if !text.trim().is_empty() => {
                debug!("engine produced a final answer");
                Ok(Decision::answer(text))
            }
            _ => Err(ReasoningError::InvalidResponse(
                "response carried neither content nor tool calls".to_string(),
            )),
        }
    }

    async fn generate(&self, instruction: &str, input: &str) -> Result<String, ReasoningError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage::text("system", instruction),
                ChatMessage::text("user", input),
            ],
            max_tokens: self.config.max_tokens,
            tools: None,
            tool_choice: None,
        };

        let message = self.complete(&request).await?;
        match message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ReasoningError::InvalidResponse(
                "completion carried no content".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use troupe_core::{CapabilityName, InputSchema, ParamKind, ParamSpec};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reasoner_for(server: &MockServer) -> ChatReasoner {
        ChatReasoner::new(
            ChatReasonerConfig::new(format!("{}/v1/chat/completions", server.uri()))
                .with_model("test-model")
                .with_timeout(Duration::from_secs(5)),
        )
        .expect("reasoner builds")
    }

    fn search_descriptor() -> CapabilityDescriptor {
        CapabilityDescriptor::new(
            CapabilityName::parse("web_search").expect("valid name"),
            "Searches the web.",
        )
        .with_schema(InputSchema::new().with_param(ParamSpec::required(
            "query",
            ParamKind::String,
            "Search query",
        )))
    }

    fn tool_call_response() -> serde_json::Value {
        json!({
            "choices": [{
                "message": {
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {
                            "name": "web_search",
                            "arguments": "{\"query\": \"rust agents\"}"
                        }
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        })
    }

    #[tokio::test]
    async fn tool_calls_become_delegation_decisions() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tool_call_response()))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let transcript = Transcript::new("research rust agents");
        let descriptor = search_descriptor();

        let decision = reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .expect("decision");

        match decision {
            Decision::Delegate {
                capability,
                arguments,
            } => {
                assert_eq!(capability, "web_search");
                assert_eq!(arguments.str_arg("query"), Some("rust agents"));
            }
            other => panic!("expected delegation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_content_becomes_an_answer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "Rust agents are frameworks.", "tool_calls": null },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let transcript = Transcript::new("what are rust agents");
        let descriptor = search_descriptor();

        let decision = reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .expect("decision");
        assert_eq!(decision, Decision::answer("Rust agents are frameworks."));
    }

    #[tokio::test]
    async fn transcript_renders_role_tagged_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "done", "tool_calls": null },
                    "finish_reason": "stop"
                }]
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let mut transcript = Transcript::new("research something");
        transcript.push_delegation(
            "web_search",
            CapabilityArgs::new().with("query", json!("something")),
        );
        transcript.push_result("web_search", "three links", true);
        let descriptor = search_descriptor();

        reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .expect("decision");

        let requests = server.received_requests().await.expect("recorded requests");
        let body: Value = serde_json::from_slice(&requests[0].body).expect("request body");
        let messages = body["messages"].as_array().expect("messages array");

        let roles: Vec<&str> = messages
            .iter()
            .map(|m| m["role"].as_str().unwrap_or_default())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool"]);

        // The tool result is tied back to the synthesized call id.
        assert_eq!(messages[3]["tool_call_id"], json!("call_0"));
        assert_eq!(messages[3]["content"], json!("three links"));
        // Descriptors ride along as function tools.
        assert_eq!(body["tools"][0]["function"]["name"], json!("web_search"));
        assert_eq!(
            body["tools"][0]["function"]["parameters"]["required"],
            json!(["query"])
        );
    }

    #[tokio::test]
    async fn failed_results_are_marked_for_the_engine() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "done", "tool_calls": null }
                }]
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let mut transcript = Transcript::new("goal");
        transcript.push_delegation("web_search", CapabilityArgs::new());
        transcript.push_result("web_search", "capability not found: web_serch", false);
        let descriptor = search_descriptor();

        reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .expect("decision");

        let requests = server.received_requests().await.expect("recorded requests");
        let body: Value = serde_json::from_slice(&requests[0].body).expect("request body");
        let tool_message = &body["messages"][3];
        assert!(
            tool_message["content"]
                .as_str()
                .expect("tool content")
                .starts_with("ERROR:")
        );
    }

    #[tokio::test]
    async fn server_errors_surface_as_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": { "message": "overloaded" }
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let transcript = Transcript::new("goal");
        let descriptor = search_descriptor();

        let err = reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::Unavailable(ref m) if m.contains("overloaded")));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn empty_response_is_invalid_not_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": null, "tool_calls": null }
                }]
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let transcript = Transcript::new("goal");
        let descriptor = search_descriptor();

        let err = reasoner
            .decide(&transcript, &[&descriptor])
            .await
            .unwrap_err();
        assert!(matches!(err, ReasoningError::InvalidResponse(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn generate_is_a_single_instruction_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": { "content": "A concise summary." }
                }]
            })))
            .mount(&server)
            .await;

        let reasoner = reasoner_for(&server);
        let summary = reasoner
            .generate("Summarize the text.", "ADK is a toolkit.")
            .await
            .expect("summary");
        assert_eq!(summary, "A concise summary.");

        let requests = server.received_requests().await.expect("recorded requests");
        let body: Value = serde_json::from_slice(&requests[0].body).expect("request body");
        assert_eq!(body["messages"][0]["role"], json!("system"));
        assert_eq!(body["messages"][1]["content"], json!("ADK is a toolkit."));
        assert!(body.get("tools").is_none());
    }
}
