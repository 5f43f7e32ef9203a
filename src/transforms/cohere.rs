//! Cohere chat history conversion.

use serde::Serialize;
use tracing::debug;

use super::common::inline_speaker_name;
use super::message::{ChatMessage, Role};
use super::names::PromptNames;
use crate::constants::COHERE_TOOL_CALL_PRIMER;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohereConversion {
    pub chat_history: Vec<ChatMessage>,
}

/// Convert a prompt to Cohere's chat history.
///
/// Cohere wants text on every tool-calling assistant turn, so the assistant
/// turn right before it is folded in, or a short primer naming the tools is
/// used. Names have no field of their own and are inlined as text.
pub fn convert_cohere_messages(
    messages: Vec<ChatMessage>,
    names: &PromptNames,
    placeholder: &str,
) -> CohereConversion {
    let mut chat_history: Vec<ChatMessage> = Vec::with_capacity(messages.len().max(1));

    if messages.is_empty() {
        chat_history.push(ChatMessage::user(placeholder));
    }

    for mut message in messages {
        if message.has_tool_calls() {
            let previous = chat_history
                .pop_if(|last| last.role == Role::Assistant && !last.has_tool_calls());
            match previous {
                Some(mut previous) => {
                    if !message.content.is_empty() {
                        previous.content.append(message.content);
                    }
                    message.content = previous.content;
                }
                None if message.content.is_empty() => {
                    let tools = message
                        .tool_calls
                        .iter()
                        .flatten()
                        .map(|call| call.function.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    message.content = format!("{COHERE_TOOL_CALL_PRIMER}: {tools}").into();
                }
                None => {}
            }
        }

        inline_speaker_name(&mut message, names);
        chat_history.push(message);
    }

    debug!(messages = chat_history.len(), "Converted prompt to Cohere chat history");
    CohereConversion { chat_history }
}
