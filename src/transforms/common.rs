//! Shared utilities for prompt transformations.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::Rng;
use serde_json::Value;
use tracing::warn;

use super::message::{ChatMessage, Role};
use super::names::{PromptNames, prefix_name};
use crate::constants::{EXAMPLE_ASSISTANT, EXAMPLE_USER};

/// Generate an opaque placeholder token for a non-text content part.
/// Format: base64 of 32 random bytes (44 chars).
pub fn generate_content_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    STANDARD.encode(bytes)
}

/// Split a `data:` URI into `(mime_type, base64_data)`.
pub fn parse_data_uri(url: &str) -> Option<(String, String)> {
    let rest = url.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let media_type = header.split(';').next().filter(|m| !m.is_empty())?;
    Some((media_type.to_string(), data.to_string()))
}

/// Parse a tool-call argument string, passing it through as a JSON string
/// when it is not valid JSON.
pub fn try_parse(arguments: &str) -> Value {
    match serde_json::from_str(arguments) {
        Ok(value) => value,
        Err(e) => {
            warn!("Tool call arguments are not valid JSON, passing through raw: {e}");
            Value::String(arguments.to_string())
        }
    }
}

/// Inline speaker prefix for a system-role example turn.
/// Returns the text unchanged for any other name.
pub fn prefix_example(name: Option<&str>, text: &str, names: &PromptNames) -> String {
    match name {
        Some(EXAMPLE_ASSISTANT) => names.prefix_char_name(text),
        Some(EXAMPLE_USER) => names.prefix_user_name(text),
        _ => text.to_string(),
    }
}

/// Apply the shared name-prefix rules to a message and drop its `name`:
/// example turns on system messages get the char/user name, any other named
/// non-system message gets its own name.
pub fn inline_speaker_name(message: &mut ChatMessage, names: &PromptNames) {
    let Some(name) = message.name.take() else {
        return;
    };
    if message.role == Role::System {
        message
            .content
            .map_text(|text| prefix_example(Some(&name), text, names));
    } else {
        message.content.map_text(|text| prefix_name(&name, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::message::MessageContent;
    use serde_json::json;

    #[test]
    fn test_generate_content_token_format() {
        let token = generate_content_token();
        assert_eq!(token.len(), 44);
        assert_eq!(STANDARD.decode(&token).unwrap().len(), 32);
        assert_ne!(token, generate_content_token());
    }

    #[test]
    fn test_parse_data_uri() {
        assert_eq!(
            parse_data_uri("data:image/png;base64,iVBORw0"),
            Some(("image/png".to_string(), "iVBORw0".to_string()))
        );
        assert_eq!(parse_data_uri("https://example.com/cat.png"), None);
        assert_eq!(parse_data_uri("data:;base64,AAAA"), None);
    }

    #[test]
    fn test_try_parse_degrades_to_string() {
        assert_eq!(try_parse(r#"{"city":"Oslo"}"#), json!({"city": "Oslo"}));
        assert_eq!(try_parse("{city: Oslo"), json!("{city: Oslo"));
    }

    #[test]
    fn test_inline_speaker_name() {
        let names = PromptNames::resolve(Some("Nia"), Some("Kai"), None);

        let mut example = ChatMessage::system("hey").with_name(EXAMPLE_USER);
        inline_speaker_name(&mut example, &names);
        assert_eq!(example.content, MessageContent::from("Kai: hey"));
        assert!(example.name.is_none());

        let mut named = ChatMessage::assistant("hello").with_name("Nia");
        inline_speaker_name(&mut named, &names);
        assert_eq!(named.content, MessageContent::from("Nia: hello"));
        assert_eq!(named.role, Role::Assistant);
    }
}
