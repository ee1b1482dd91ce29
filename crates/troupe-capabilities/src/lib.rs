//! # Troupe Capabilities
//!
//! Research specialist capabilities for the troupe coordination runtime:
//! web search, page extraction, and summarization. Each is an independent,
//! narrowly-scoped [`Capability`](troupe_core::Capability); the delegation
//! loop decides when and in what order they run.

pub mod extract;
pub mod search;
pub mod summarize;

pub use extract::{DEFAULT_MAX_CHARS, EXTRACT_CAPABILITY, PageExtractCapability};
pub use search::{SEARCH_CAPABILITY, SearchConfig, WebSearchCapability};
pub use summarize::{SUMMARIZE_CAPABILITY, summarizer};

use std::sync::Arc;
use troupe_core::{CapabilityRegistry, ReasoningAdapter};

/// Assemble the full research team: search, extraction, summarization.
///
/// Registration order matters: it is the deterministic tie-break the
/// reasoning engine sees when several capabilities look applicable.
pub fn research_registry(
    search: SearchConfig,
    reasoning: Arc<dyn ReasoningAdapter>,
) -> CapabilityRegistry {
    CapabilityRegistry::new()
        .with_capability(Arc::new(WebSearchCapability::new(search)))
        .with_capability(Arc::new(PageExtractCapability::new()))
        .with_capability(Arc::new(summarizer(reasoning)))
}
