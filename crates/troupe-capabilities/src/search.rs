//! Web search capability backed by a Tavily-style search API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use troupe_core::{
    Capability, CapabilityArgs, CapabilityDescriptor, CapabilityName, FailureReason, InputSchema,
    InvocationResult, ParamKind, ParamSpec,
};

/// Registered name of the search capability.
pub const SEARCH_CAPABILITY: &str = "web_search";

/// Configuration for [`WebSearchCapability`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Search API endpoint.
    pub endpoint: String,
    /// API key sent in the request body.
    pub api_key: String,
    /// Default result cap when the caller does not supply one.
    pub max_results: u32,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl SearchConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            max_results: 5,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Searches the web through a Tavily-style JSON API and formats the hits
/// as plain text for the transcript.
///
/// Raw page content is never requested; pulling full text is the
/// extraction capability's job.
pub struct WebSearchCapability {
    descriptor: CapabilityDescriptor,
    client: Client,
    config: SearchConfig,
}

impl WebSearchCapability {
    pub fn new(config: SearchConfig) -> Self {
        let name = CapabilityName::parse(SEARCH_CAPABILITY).expect("static name is valid");
        let descriptor = CapabilityDescriptor::new(
            name,
            "Searches the web for pages relevant to a query. Returns result \
             titles, links, and snippets, plus a direct answer when the \
             search service can produce one. Use this to find information \
             or discover relevant pages for a topic.",
        )
        .with_schema(
            InputSchema::new()
                .with_param(ParamSpec::required(
                    "query",
                    ParamKind::String,
                    "The research topic or question to search for",
                ))
                .with_param(ParamSpec::optional(
                    "max_results",
                    ParamKind::Integer,
                    "Maximum number of results to return",
                )),
        );
        Self {
            descriptor,
            client: Client::new(),
            config,
        }
    }

    fn format_results(query: &str, response: SearchResponse) -> String {
        if response.results.is_empty() && response.answer.is_none() {
            return format!("No results found for '{query}'.");
        }

        let mut out = String::new();
        if let Some(answer) = response.answer.filter(|a| !a.trim().is_empty()) {
            out.push_str(&format!("Answer: {answer}\n\n"));
        }
        for (index, hit) in response.results.iter().enumerate() {
            out.push_str(&format!("{}. {} - {}\n", index + 1, hit.title, hit.url));
            if !hit.content.trim().is_empty() {
                out.push_str(&format!("   {}\n", hit.content.trim()));
            }
        }
        out.trim_end().to_string()
    }
}

#[async_trait]
impl Capability for WebSearchCapability {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult {
        // The executor has already validated presence and kind.
        let query = args.str_arg("query").unwrap_or_default();
        let max_results = args
            .int_arg("max_results")
            .map(|n| n.clamp(1, 20) as u32)
            .unwrap_or(self.config.max_results);

        debug!(query, max_results, "running web search");

        let request = SearchRequest {
            api_key: &self.config.api_key,
            query,
            max_results,
            search_depth: "advanced",
            include_answer: true,
            include_raw_content: false,
        };

        let response = match self
            .client
            .post(&self.config.endpoint)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return InvocationResult::failed(FailureReason::Timeout {
                    operation: format!("search for '{query}'"),
                });
            }
            Err(e) => {
                return InvocationResult::failed(FailureReason::Network {
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return InvocationResult::failed(FailureReason::Network {
                message: format!("search service returned {status}: {body}"),
            });
        }

        match response.json::<SearchResponse>().await {
            Ok(parsed) => InvocationResult::success(Self::format_results(query, parsed)),
            Err(e) => InvocationResult::failed(FailureReason::Provider {
                message: format!("unreadable search response: {e}"),
            }),
        }
    }
}
