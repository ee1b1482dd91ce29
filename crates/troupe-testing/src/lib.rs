//! # Troupe Testing
//!
//! Test doubles for the troupe coordination runtime: mock capabilities
//! with canned responses and call tracking, and a scripted reasoning
//! adapter that replays a fixed decision sequence. Both make the
//! delegation loop's behavior fully deterministic in tests.

pub mod mock_capabilities;
pub mod scripted;

pub use mock_capabilities::MockCapability;
pub use scripted::ScriptedReasoner;
