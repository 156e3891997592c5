//! Agent runtime - the conversational pipeline behind OLIVIA
//!
//! This crate turns one chat message into one structured reply:
//! - Starts or advances the uniform-policy menu when the message asks for it
//! - Routes the message to an HR domain with fuzzy keyword scoring
//! - Short-circuits policy-sensitive questions with canned rule answers
//! - Otherwise asks the completion service, scoped to the domain's policy text
//! - Appends quick-access links and the closing phrase
//!
//! # Architecture
//!
//! 1. **Flow** (`olivia_core::flows`) - uniform lookup menu, per session
//! 2. **Routing** (`router`) - query to `Domain`, default LEAVE
//! 3. **Rules** (`rules`) - ordered canned answers, first match wins
//! 4. **Completion** (`prompt`, `llm`) - domain-scoped prompt, bounded call
//! 5. **Composition** (`suggest`, `compose`) - links, line limit, closing phrase
//!
//! # Safety Principle
//!
//! The model never answers what a rule covers, and a failed completion call is
//! never surfaced to the user: the runtime always answers with something.

pub mod compose;
pub mod llm;
pub mod prompt;
pub mod router;
pub mod rules;
pub mod runtime;
pub mod suggest;

pub use llm::{ChatCompletionsClient, CompletionClient, CompletionError};
pub use runtime::{AgentRuntime, Diagnostics, RuntimeDeps};
