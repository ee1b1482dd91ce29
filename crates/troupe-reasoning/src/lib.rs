//! # Troupe Reasoning
//!
//! Reasoning-engine adapters for the troupe coordination runtime.
//!
//! [`ChatReasoner`] speaks the OpenAI-compatible chat-completions protocol:
//! the delegation transcript is rendered as role-tagged messages, the
//! registered capabilities as function-calling tools, and the engine's
//! reply is mapped onto the closed [`Decision`](troupe_core::Decision)
//! union the loop consumes.

pub mod chat;

pub use chat::{ChatReasoner, ChatReasonerConfig, ChatSetupError};
