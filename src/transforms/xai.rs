//! xAI Grok chat conversion.

use super::message::{ChatMessage, Role};
use super::names::{PromptNames, prefix_name};
use crate::constants::{EXAMPLE_ASSISTANT, EXAMPLE_USER};

/// Inline speaker names for xAI, which ignores the `name` field.
///
/// Named assistant turns and `example_assistant` turns get the character
/// name, `example_user` turns get the user name and named user turns keep
/// their own name. No other reshaping happens.
pub fn convert_xai_messages(messages: Vec<ChatMessage>, names: &PromptNames) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .map(|mut message| {
            let Some(name) = message.name.take() else {
                return message;
            };
            match (message.role, name.as_str()) {
                (Role::Assistant, _) | (Role::System, EXAMPLE_ASSISTANT) => {
                    message.content.map_text(|text| names.prefix_char_name(text));
                }
                (Role::System, EXAMPLE_USER) => {
                    message.content.map_text(|text| names.prefix_user_name(text));
                }
                (Role::User, name) => {
                    message.content.map_text(|text| prefix_name(name, text));
                }
                _ => {}
            }
            message
        })
        .collect()
}
