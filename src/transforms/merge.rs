//! Role squashing and alternation repair for chat-completion style APIs.
//!
//! `post_process_prompt` picks a [`MergePolicy`] from the requested
//! [`ProcessingType`] and runs [`merge_messages`]:
//! 1. Flatten content, inline speaker names, demote/strip tool data
//! 2. Squash adjacent same-role messages
//! 3. Guarantee a non-empty result
//! 4. Expand media tokens back into content parts
//! 5. (strict) Keep system only at index 0, insert placeholders, re-merge

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::common::prefix_example;
use super::content::ContentTokens;
use super::message::{ChatMessage, Role, ToolCall};
use super::names::{PromptNames, prefix_name};
use crate::constants::SEGMENT_DELIMITER;

/// Structural guarantees requested from [`merge_messages`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// At most one leading system message; later system turns become user.
    pub strict: bool,
    /// Insert a placeholder user turn where alternation would break.
    pub placeholders: bool,
    /// Collapse the whole conversation into user turns.
    pub single: bool,
    /// Keep the tool role and tool call metadata.
    pub tools: bool,
}

/// Prompt post-processing mode selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingType {
    #[default]
    None,
    #[serde(alias = "claude")]
    Merge,
    MergeTools,
    Semi,
    SemiTools,
    Strict,
    StrictTools,
    Single,
}

impl ProcessingType {
    /// Merge policy for this mode; `None` means pass-through.
    pub fn policy(self) -> Option<MergePolicy> {
        let (strict, placeholders, single, tools) = match self {
            ProcessingType::None => return None,
            ProcessingType::Merge => (false, false, false, false),
            ProcessingType::MergeTools => (false, false, false, true),
            ProcessingType::Semi => (true, false, false, false),
            ProcessingType::SemiTools => (true, false, false, true),
            ProcessingType::Strict => (true, true, false, false),
            ProcessingType::StrictTools => (true, true, false, true),
            ProcessingType::Single => (true, false, true, false),
        };
        Some(MergePolicy {
            strict,
            placeholders,
            single,
            tools,
        })
    }
}

/// Apply the post-processing mode to a prompt.
pub fn post_process_prompt(
    messages: Vec<ChatMessage>,
    processing: ProcessingType,
    names: &PromptNames,
    placeholder: &str,
) -> Vec<ChatMessage> {
    match processing.policy() {
        Some(policy) => merge_messages(messages, names, policy, placeholder),
        None => messages,
    }
}

/// Message with flattened string content, used while squashing.
struct FlatMessage {
    role: Role,
    content: String,
    tool_calls: Option<Vec<ToolCall>>,
    tool_call_id: Option<String>,
}

/// Merge a message list according to `policy`. Never returns an empty list.
pub fn merge_messages(
    messages: Vec<ChatMessage>,
    names: &PromptNames,
    policy: MergePolicy,
    placeholder: &str,
) -> Vec<ChatMessage> {
    let input_len = messages.len();
    let merged = merge_pass(messages, names, policy, placeholder);

    if !policy.strict {
        debug!(input_len, output_len = merged.len(), "Merged prompt");
        return merged;
    }

    let structured = enforce_leading_system(merged, policy.placeholders, placeholder);
    let relaxed = MergePolicy {
        strict: false,
        single: false,
        ..policy
    };
    let merged = merge_pass(structured, names, relaxed, placeholder);
    debug!(input_len, output_len = merged.len(), "Merged prompt (strict)");
    merged
}

fn merge_pass(
    messages: Vec<ChatMessage>,
    names: &PromptNames,
    policy: MergePolicy,
    placeholder: &str,
) -> Vec<ChatMessage> {
    let mut tokens = ContentTokens::default();

    let mut squashed: Vec<FlatMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        let flat = normalize(message, names, policy, &mut tokens);
        match squashed.last_mut() {
            Some(last)
                if last.role == flat.role && flat.role != Role::Tool && !flat.content.is_empty() =>
            {
                last.content.push_str(SEGMENT_DELIMITER);
                last.content.push_str(&flat.content);
                if let Some(calls) = flat.tool_calls {
                    last.tool_calls.get_or_insert_with(Vec::new).extend(calls);
                }
            }
            _ => squashed.push(flat),
        }
    }

    if squashed.is_empty() {
        squashed.push(FlatMessage {
            role: Role::User,
            content: placeholder.to_string(),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    squashed
        .into_iter()
        .map(|flat| ChatMessage {
            role: flat.role,
            name: None,
            content: tokens.expand(&flat.content),
            tool_calls: flat.tool_calls,
            tool_call_id: flat.tool_call_id,
        })
        .collect()
}

fn normalize(
    message: ChatMessage,
    names: &PromptNames,
    policy: MergePolicy,
    tokens: &mut ContentTokens,
) -> FlatMessage {
    let mut content = tokens.flatten(message.content);
    let mut role = message.role;

    match (role, message.name.as_deref()) {
        (Role::System, name) => content = prefix_example(name, &content, names),
        (_, Some(name)) => content = prefix_name(name, &content),
        _ => {}
    }

    if role == Role::Tool && !policy.tools {
        role = Role::User;
    }

    if policy.single {
        content = match role {
            Role::Assistant => names.prefix_char_name(&content),
            Role::User => names.prefix_user_name(&content),
            _ => content,
        };
        role = Role::User;
    }

    let (tool_calls, tool_call_id) = if policy.tools {
        (message.tool_calls, message.tool_call_id)
    } else {
        (None, None)
    };

    FlatMessage {
        role,
        content,
        tool_calls,
        tool_call_id,
    }
}

/// Force every system turn after the first message to user and, when asked,
/// insert a placeholder user turn so the prompt opens with system→user or user.
fn enforce_leading_system(
    mut messages: Vec<ChatMessage>,
    placeholders: bool,
    placeholder: &str,
) -> Vec<ChatMessage> {
    for message in messages.iter_mut().skip(1) {
        if message.role == Role::System {
            message.role = Role::User;
        }
    }

    if placeholders && let Some(first_role) = messages.first().map(|m| m.role) {
        let filler = ChatMessage::user(placeholder);
        match first_role {
            Role::System => {
                if messages.get(1).is_none_or(|second| second.role != Role::User) {
                    messages.insert(1, filler);
                }
            }
            Role::User => {}
            _ => messages.insert(0, filler),
        }
    }

    messages
}
