//! Google Gemini `contents` conversion.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::common::{parse_data_uri, prefix_example, try_parse};
use super::message::{ChatMessage, ContentPart, MessageContent, Role};
use super::names::{PromptNames, prefix_name};
use crate::constants::{EXAMPLE_ASSISTANT, EXAMPLE_USER, SEGMENT_DELIMITER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GoogleRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GooglePart {
    Text(String),
    InlineData(GoogleBlob),
    FunctionCall(GoogleFunctionCall),
    FunctionResponse(GoogleFunctionResponse),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleBlob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoogleFunctionCall {
    pub name: String,
    pub args: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoogleFunctionResponse {
    pub name: String,
    pub response: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoogleContent {
    pub role: GoogleRole,
    pub parts: Vec<GooglePart>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<GooglePart>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GooglePrompt {
    pub contents: Vec<GoogleContent>,
    pub system_instruction: SystemInstruction,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GoogleOptions {
    /// Move leading system messages into `system_instruction`.
    pub use_system_prompt: bool,
}

/// Convert a prompt to Gemini `contents` plus a `system_instruction`.
pub fn convert_google_prompt(
    messages: Vec<ChatMessage>,
    options: &GoogleOptions,
    names: &PromptNames,
) -> GooglePrompt {
    let mut messages = messages.into_iter().peekable();
    let mut system_instruction = SystemInstruction::default();

    if options.use_system_prompt {
        // The last message always stays in `contents`.
        let mut remaining = messages.len();
        while remaining > 1
            && let Some(message) = messages.next_if(|m| m.role == Role::System)
        {
            let text = prefix_example(message.name.as_deref(), &message.content.text(), names);
            system_instruction.parts.push(GooglePart::Text(text));
            remaining -= 1;
        }
    }

    let mut tool_names: HashMap<String, String> = HashMap::new();
    let mut contents: Vec<GoogleContent> = Vec::new();

    for message in messages {
        let role = match message.role {
            Role::Assistant => GoogleRole::Model,
            Role::System | Role::User | Role::Tool => GoogleRole::User,
        };
        let parts = convert_parts(message, names, &mut tool_names);

        match contents.last_mut() {
            Some(last) if last.role == role => merge_parts(&mut last.parts, parts),
            _ => contents.push(GoogleContent { role, parts }),
        }
    }

    debug!(
        contents = contents.len(),
        system_parts = system_instruction.parts.len(),
        "Converted prompt to Google contents"
    );

    GooglePrompt {
        contents,
        system_instruction,
    }
}

fn convert_parts(
    message: ChatMessage,
    names: &PromptNames,
    tool_names: &mut HashMap<String, String>,
) -> Vec<GooglePart> {
    if let Some(id) = message.tool_call_id.as_deref() {
        let name = tool_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        return vec![GooglePart::FunctionResponse(GoogleFunctionResponse {
            response: json!({ "name": name, "content": try_parse(&message.content.text()) }),
            name,
        })];
    }

    let mut content = message.content;
    if let Some(name) = message.name.as_deref() {
        content.map_text(|text| match name {
            EXAMPLE_USER => names.prefix_user_name(text),
            EXAMPLE_ASSISTANT => names.prefix_char_name(text),
            _ => prefix_name(name, text),
        });
    }

    let mut parts: Vec<GooglePart> = Vec::new();
    match content {
        MessageContent::Text(text) => parts.push(GooglePart::Text(text)),
        MessageContent::Parts(content_parts) => {
            for part in content_parts {
                match part {
                    ContentPart::Text { text } => parts.push(GooglePart::Text(text)),
                    ContentPart::ImageUrl { image_url: media } | ContentPart::VideoUrl { video_url: media } => {
                        match parse_data_uri(&media.url) {
                            Some((mime_type, data)) => {
                                parts.push(GooglePart::InlineData(GoogleBlob { mime_type, data }))
                            }
                            None => warn!("Dropping media part that is not a data URI"),
                        }
                    }
                    ContentPart::Unsupported => {}
                }
            }
        }
    }

    for call in message.tool_calls.into_iter().flatten() {
        tool_names.insert(call.id, call.function.name.clone());
        parts.push(GooglePart::FunctionCall(GoogleFunctionCall {
            args: try_parse(&call.function.arguments),
            name: call.function.name,
        }));
    }

    if parts.len() > 1 {
        parts.retain(|p| !matches!(p, GooglePart::Text(text) if text.is_empty()));
    }
    parts
}

/// Merge into an existing same-role turn: text joins the first text part,
/// everything else is appended.
fn merge_parts(target: &mut Vec<GooglePart>, parts: Vec<GooglePart>) {
    for part in parts {
        match part {
            GooglePart::Text(text) if text.is_empty() => {}
            GooglePart::Text(text) => {
                match target.iter_mut().find_map(|p| match p {
                    GooglePart::Text(existing) => Some(existing),
                    _ => None,
                }) {
                    Some(existing) => {
                        existing.push_str(SEGMENT_DELIMITER);
                        existing.push_str(&text);
                    }
                    None => target.push(GooglePart::Text(text)),
                }
            }
            other => target.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::message::ToolCall;

    const PNG: &str = "data:image/png;base64,iVBORw0KGgo=";

    fn names() -> PromptNames {
        PromptNames::resolve(Some("Nia"), Some("Kai"), None)
    }

    fn convert(messages: Vec<ChatMessage>, use_system_prompt: bool) -> GooglePrompt {
        convert_google_prompt(messages, &GoogleOptions { use_system_prompt }, &names())
    }

    #[test]
    fn test_system_instruction_extraction() {
        let prompt = convert(
            vec![
                ChatMessage::system("rules"),
                ChatMessage::system("hey").with_name(EXAMPLE_USER),
                ChatMessage::user("hi"),
            ],
            true,
        );
        let value = serde_json::to_value(&prompt).unwrap();
        assert_eq!(
            value["system_instruction"],
            json!({"parts": [{"text": "rules"}, {"text": "Kai: hey"}]})
        );
        assert_eq!(value["contents"], json!([{"role": "user", "parts": [{"text": "hi"}]}]));
    }

    #[test]
    fn test_last_system_message_stays_in_contents() {
        let prompt = convert(vec![ChatMessage::system("a"), ChatMessage::system("b")], true);
        assert_eq!(prompt.system_instruction.parts, vec![GooglePart::Text("a".to_string())]);
        assert_eq!(
            prompt.contents,
            vec![GoogleContent {
                role: GoogleRole::User,
                parts: vec![GooglePart::Text("b".to_string())],
            }]
        );
    }

    #[test]
    fn test_roles_and_merging() {
        let prompt = convert(
            vec![
                ChatMessage::system("rules"),
                ChatMessage::user("hi"),
                ChatMessage::assistant("hello"),
                ChatMessage::assistant("again"),
            ],
            false,
        );
        let value = serde_json::to_value(&prompt.contents).unwrap();
        assert_eq!(
            value,
            json!([
                {"role": "user", "parts": [{"text": "rules\n\nhi"}]},
                {"role": "model", "parts": [{"text": "hello\n\nagain"}]}
            ])
        );
    }

    #[test]
    fn test_function_call_and_response() {
        let prompt = convert(
            vec![
                ChatMessage::user("weather?"),
                ChatMessage::assistant("")
                    .with_tool_calls(vec![ToolCall::new("c1", "get_weather", r#"{"city":"Oslo"}"#)]),
                ChatMessage::tool("c1", r#"{"temp":4}"#),
                ChatMessage::tool("c9", "orphan"),
            ],
            false,
        );
        let value = serde_json::to_value(&prompt.contents).unwrap();
        assert_eq!(
            value[1],
            json!({"role": "model", "parts": [
                {"functionCall": {"name": "get_weather", "args": {"city": "Oslo"}}}
            ]})
        );
        assert_eq!(
            value[2],
            json!({"role": "user", "parts": [
                {"functionResponse": {"name": "get_weather", "response": {"name": "get_weather", "content": {"temp": 4}}}},
                {"functionResponse": {"name": "unknown", "response": {"name": "unknown", "content": "orphan"}}}
            ]})
        );
    }

    #[test]
    fn test_media_becomes_inline_data() {
        let prompt = convert(
            vec![ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::text("look"),
                ContentPart::image(PNG),
                ContentPart::video("data:video/mp4;base64,AAAA"),
                ContentPart::image("https://example.com/cat.png"),
            ]))],
            false,
        );
        let value = serde_json::to_value(&prompt.contents[0].parts).unwrap();
        assert_eq!(
            value,
            json!([
                {"text": "look"},
                {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}},
                {"inlineData": {"mimeType": "video/mp4", "data": "AAAA"}}
            ])
        );
    }

    #[test]
    fn test_named_text_parts_are_prefixed() {
        let prompt = convert(
            vec![
                ChatMessage::user("hi").with_name("Orin"),
                ChatMessage::assistant("hey").with_name(EXAMPLE_ASSISTANT),
            ],
            false,
        );
        assert_eq!(prompt.contents[0].parts, vec![GooglePart::Text("Orin: hi".to_string())]);
        assert_eq!(prompt.contents[1].parts, vec![GooglePart::Text("Nia: hey".to_string())]);
    }
}
