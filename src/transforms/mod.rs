//! Prompt normalization and provider adaptation.
//!
//! This module provides:
//! - `message`, `names`: the provider-agnostic conversation model
//! - `content`: media tokenization used while squashing text
//! - `merge`: role squashing and the post-processing dispatch
//! - `claude`, `cohere`, `google`, `ai21`, `mistral`, `xai`, `text_completion`: provider adapters
//! - `tools`: tool definition conversion
//! - `reasoning`: thinking budget calculation
//! - `cache_control`: prompt-caching breakpoints
//! - `provider`: target selection and the end-to-end pipeline

pub mod ai21;
pub mod cache_control;
pub mod claude;
pub mod cohere;
pub mod common;
pub mod content;
pub mod google;
pub mod merge;
pub mod message;
pub mod mistral;
pub mod names;
pub mod provider;
pub mod reasoning;
pub mod text_completion;
pub mod tools;
pub mod xai;

// Re-export commonly used items
pub use cache_control::{CacheControl, inject_cache_control, inject_openrouter_cache_control};
pub use claude::{ClaudeMessagesOptions, ClaudeTextOptions, convert_claude_messages, convert_claude_prompt};
pub use merge::{MergePolicy, ProcessingType, merge_messages, post_process_prompt};
pub use message::{ChatMessage, ContentPart, MessageContent, Role, ToolCall};
pub use names::PromptNames;
pub use provider::{ProviderTarget, convert_for_provider};
pub use reasoning::{ReasoningEffort, calculate_claude_budget_tokens, calculate_google_budget_tokens};
