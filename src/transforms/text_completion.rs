//! Role-tagged plain text prompt for text completion endpoints.

use super::message::{ChatMessage, Role};

/// Render messages as `"<speaker>: <content>"` lines ending with an
/// `assistant:` cue. Unnamed system messages use `System`, named system
/// messages use their name, everything else uses the role.
pub fn convert_text_completion_prompt(messages: &[ChatMessage]) -> String {
    let mut prompt = messages
        .iter()
        .map(|message| {
            let speaker = match (message.role, message.name.as_deref()) {
                (Role::System, None) => "System",
                (Role::System, Some(name)) => name,
                (role, _) => role.as_str(),
            };
            format!("{speaker}: {}", message.content.text())
        })
        .collect::<Vec<_>>()
        .join("\n");
    prompt.push_str("\nassistant:");
    prompt
}
