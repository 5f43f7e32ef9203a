//! AI21 Jamba chat conversion.

use tracing::debug;

use super::common::prefix_example;
use super::message::{ChatMessage, Role};
use super::names::{PromptNames, prefix_name};
use crate::constants::SEGMENT_DELIMITER;

/// Convert a prompt to AI21 messages.
///
/// AI21 only accepts a single leading system message and strictly
/// alternating text turns, so leading system messages are joined, names are
/// inlined and same-role neighbours are concatenated. Tool calls and tool
/// result ids are kept; tool results are never concatenated.
pub fn convert_ai21_messages(
    messages: Vec<ChatMessage>,
    names: &PromptNames,
    placeholder: &str,
) -> Vec<ChatMessage> {
    let mut messages = messages.into_iter().peekable();

    let mut system_prompt = String::new();
    while let Some(message) = messages.next_if(|m| m.role == Role::System) {
        system_prompt.push_str(&prefix_example(
            message.name.as_deref(),
            &message.content.text(),
            names,
        ));
        system_prompt.push_str(SEGMENT_DELIMITER);
    }

    let mut rest: Vec<ChatMessage> = messages.collect();
    if rest.is_empty() {
        rest.push(ChatMessage::user(placeholder));
    }

    let system_prompt = system_prompt.trim();
    let leading = (!system_prompt.is_empty()).then(|| ChatMessage::system(system_prompt));

    let mut merged: Vec<ChatMessage> = Vec::with_capacity(rest.len() + 1);
    for message in leading.into_iter().chain(rest) {
        let ChatMessage {
            role,
            name,
            content,
            tool_calls,
            tool_call_id,
        } = message;

        let mut text = content.text();
        if let Some(name) = name.as_deref()
            && role != Role::System
        {
            text = prefix_name(name, &text);
        }

        match merged.last_mut() {
            Some(last) if last.role == role && role != Role::Tool => {
                last.content.append(text.into());
                if let Some(calls) = tool_calls {
                    last.tool_calls.get_or_insert_with(Vec::new).extend(calls);
                }
            }
            _ => merged.push(ChatMessage {
                role,
                name: None,
                content: text.into(),
                tool_calls,
                tool_call_id,
            }),
        }
    }

    debug!(messages = merged.len(), "Converted prompt to AI21 messages");
    merged
}
