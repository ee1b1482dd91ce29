//! Page extraction capability: fetch a URL and reduce it to readable text.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use troupe_core::{
    Capability, CapabilityArgs, CapabilityDescriptor, CapabilityName, FailureReason, InputSchema,
    InvocationResult, ParamKind, ParamSpec,
};

/// Registered name of the extraction capability.
pub const EXTRACT_CAPABILITY: &str = "page_extract";

/// Default truncation limit for extracted content, in characters.
pub const DEFAULT_MAX_CHARS: usize = 10_000;

static SCRIPT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("static pattern compiles"));
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("static pattern compiles"));
static BLOCK_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:p|div|li|tr|h[1-6])>|<br\s*/?>").expect("static pattern compiles")
});
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]+>").expect("static pattern compiles"));
static TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("static pattern compiles"));
static HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("static pattern compiles"));
static BLANK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n\s*\n+").expect("static pattern compiles"));

/// Fetches a web page and extracts its primary textual content.
///
/// Scripts, styles, and markup are stripped, entities decoded, and the
/// result truncated with an explicit note. The page title is recovered from
/// the title tag, falling back to the first heading and then the URL tail.
pub struct PageExtractCapability {
    descriptor: CapabilityDescriptor,
    client: Client,
    max_chars: usize,
    timeout: Duration,
}

impl Default for PageExtractCapability {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractCapability {
    pub fn new() -> Self {
        let name = CapabilityName::parse(EXTRACT_CAPABILITY).expect("static name is valid");
        let descriptor = CapabilityDescriptor::new(
            name,
            "Fetches a specific web page URL and extracts its primary \
             textual content. Use this to read the full text of a page, \
             for example one found by a previous search.",
        )
        .with_schema(
            InputSchema::new()
                .with_param(ParamSpec::required(
                    "url",
                    ParamKind::String,
                    "The URL of the web page to extract content from",
                ))
                .with_param(ParamSpec::optional(
                    "max_chars",
                    ParamKind::Integer,
                    "Maximum number of characters to return",
                )),
        );
        Self {
            descriptor,
            client: Client::new(),
            max_chars: DEFAULT_MAX_CHARS,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reduce an HTML document to plain text.
    fn html_to_text(html: &str) -> String {
        let cleaned = SCRIPT_RE.replace_all(html, "");
        let cleaned = STYLE_RE.replace_all(&cleaned, "");
        let cleaned = BLOCK_END_RE.replace_all(&cleaned, "\n");
        let cleaned = TAG_RE.replace_all(&cleaned, " ");
        let decoded = html_escape::decode_html_entities(cleaned.as_ref()).to_string();

        let lines: Vec<String> = decoded
            .lines()
            .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        let joined = lines.join("\n");
        BLANK_RE.replace_all(&joined, "\n\n").trim().to_string()
    }

    /// Recover a display title: title tag, else first heading, else the
    /// last URL path segment.
    fn page_title(html: &str, url: &str) -> String {
        let from_tag = TITLE_RE
            .captures(html)
            .or_else(|| HEADING_RE.captures(html))
            .map(|c| Self::html_to_text(&c[1]));
        match from_tag {
            Some(title) if !title.is_empty() => title,
            _ => url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or(url)
                .to_string(),
        }
    }
}

#[async_trait]
impl Capability for PageExtractCapability {
    fn descriptor(&self) -> &CapabilityDescriptor {
        &self.descriptor
    }

    async fn invoke(&self, args: &CapabilityArgs) -> InvocationResult {
        let url = args.str_arg("url").unwrap_or_default();
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return InvocationResult::failed(FailureReason::InvalidArguments {
                message: format!("'{url}' is not an http(s) URL"),
            });
        }
        let max_chars = args
            .int_arg("max_chars")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(self.max_chars);

        debug!(url, max_chars, "extracting page content");

        let response = match self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return InvocationResult::failed(FailureReason::Timeout {
                    operation: format!("fetching {url}"),
                });
            }
            Err(e) => {
                return InvocationResult::failed(FailureReason::Network {
                    message: e.to_string(),
                });
            }
        };

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return InvocationResult::failed(FailureReason::NotFound {
                resource: url.to_string(),
            });
        }
        if !status.is_success() {
            return InvocationResult::failed(FailureReason::Network {
                message: format!("page returned {status}"),
            });
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                return InvocationResult::failed(FailureReason::Network {
                    message: format!("unreadable response body: {e}"),
                });
            }
        };

        let title = Self::page_title(&html, url);
        let text = Self::html_to_text(&html);
        if text.is_empty() {
            return InvocationResult::failed(FailureReason::Provider {
                message: format!("no textual content found at {url}"),
            });
        }

        let total_chars = text.chars().count();
        let truncated = total_chars > max_chars;
        let body: String = text.chars().take(max_chars).collect();

        let mut output = format!("# {title}\nSource: {url}\n\n{body}");
        if truncated {
            output.push_str(&format!(
                "\n\n[Content truncated at {max_chars} of {total_chars} characters]"
            ));
        }
        InvocationResult::success(output)
    }
}
