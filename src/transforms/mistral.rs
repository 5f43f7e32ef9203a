//! Mistral chat conversion.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use tracing::debug;

use super::common::inline_speaker_name;
use super::message::{ChatMessage, Role};
use super::names::PromptNames;
use crate::constants::MISTRAL_TOOL_ID_LEN;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MistralOptions {
    /// Send a trailing assistant message as a `prefix` continuation.
    pub enable_prefix: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MistralMessage {
    #[serde(flatten)]
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub prefix: bool,
}

/// Mistral only accepts `[a-zA-Z0-9]{9}` tool call ids.
pub fn hash_tool_id(id: &str) -> String {
    let digest = Sha512::digest(id.as_bytes());
    let mut hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    hex.truncate(MISTRAL_TOOL_ID_LEN);
    hex
}

/// Convert a prompt to Mistral messages.
pub fn convert_mistral_messages(
    messages: Vec<ChatMessage>,
    options: &MistralOptions,
    names: &PromptNames,
) -> Vec<MistralMessage> {
    let prefix_last =
        options.enable_prefix && messages.last().is_some_and(|m| m.role == Role::Assistant);

    let mut messages: Vec<ChatMessage> = messages
        .into_iter()
        .map(|mut message| {
            for call in message.tool_calls.iter_mut().flatten() {
                call.id = hash_tool_id(&call.id);
            }
            if message.role == Role::Tool
                && let Some(id) = message.tool_call_id.as_mut()
            {
                *id = hash_tool_id(id);
            }
            inline_speaker_name(&mut message, names);
            message
        })
        .collect();

    while fold_user_after_tool(&mut messages) {}

    for i in 1..messages.len() {
        if messages[i - 1].role == Role::Assistant && messages[i].role == Role::System {
            messages[i].role = Role::User;
        }
    }

    let last = messages.len().saturating_sub(1);
    let converted: Vec<MistralMessage> = messages
        .into_iter()
        .enumerate()
        .map(|(i, message)| MistralMessage {
            message,
            prefix: prefix_last && i == last,
        })
        .collect();

    debug!(messages = converted.len(), prefix = prefix_last, "Converted prompt to Mistral messages");
    converted
}

/// Mistral rejects a user turn right after a tool result. Move the first
/// such user turn into the closest earlier user turn that has content.
/// Returns whether anything changed.
fn fold_user_after_tool(messages: &mut Vec<ChatMessage>) -> bool {
    for i in 0..messages.len().saturating_sub(1) {
        if messages[i].role != Role::Tool || messages[i + 1].role != Role::User {
            continue;
        }
        let Some(target) = messages[..i]
            .iter()
            .rposition(|m| m.role == Role::User && !m.content.is_empty())
        else {
            continue;
        };
        let moved = messages.remove(i + 1);
        messages[target].content.append(moved.content);
        return true;
    }
    false
}
