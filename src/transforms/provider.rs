//! Provider selection and the full conversion pipeline.

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::ai21::convert_ai21_messages;
use super::cache_control::{inject_cache_control, inject_openrouter_cache_control};
use super::claude::{ClaudeMessagesOptions, ClaudeTextOptions, convert_claude_messages, convert_claude_prompt};
use super::cohere::convert_cohere_messages;
use super::google::{GoogleOptions, convert_google_prompt};
use super::merge::{ProcessingType, post_process_prompt};
use super::message::ChatMessage;
use super::mistral::{MistralOptions, convert_mistral_messages};
use super::names::PromptNames;
use super::text_completion::convert_text_completion_prompt;
use super::xai::convert_xai_messages;
use crate::constants::DEFAULT_CACHE_TTL;
use crate::error::ConvertError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OpenRouterClaudeOptions {
    pub cache_depth: Option<usize>,
    pub cache_ttl: Option<String>,
}

/// Target provider and its adapter options.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum ProviderTarget {
    ClaudeText(ClaudeTextOptions),
    Claude(ClaudeMessagesOptions),
    OpenrouterClaude(OpenRouterClaudeOptions),
    Cohere,
    Google(GoogleOptions),
    Ai21,
    Mistral(MistralOptions),
    Xai,
    TextCompletion,
}

impl ProviderTarget {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderTarget::ClaudeText(_) => "claude_text",
            ProviderTarget::Claude(_) => "claude",
            ProviderTarget::OpenrouterClaude(_) => "openrouter_claude",
            ProviderTarget::Cohere => "cohere",
            ProviderTarget::Google(_) => "google",
            ProviderTarget::Ai21 => "ai21",
            ProviderTarget::Mistral(_) => "mistral",
            ProviderTarget::Xai => "xai",
            ProviderTarget::TextCompletion => "text_completion",
        }
    }
}

/// Run dispatch, the provider adapter and, where configured, cache-control
/// injection. Returns the provider request fragment.
///
/// This function handles:
/// - `claude_text`, `text_completion` → `{"prompt": ...}`
/// - `claude` → `{"messages": [...], "system": [...]}`
/// - `google` → `{"contents": [...], "system_instruction": {...}}`
/// - `cohere` → `{"chat_history": [...]}`
/// - everything else → `{"messages": [...]}`
pub fn convert_for_provider(
    messages: Vec<ChatMessage>,
    processing: ProcessingType,
    names: &PromptNames,
    target: &ProviderTarget,
    placeholder: &str,
) -> Result<Value, ConvertError> {
    let messages = post_process_prompt(messages, processing, names, placeholder);
    debug!(
        provider = target.name(),
        ?processing,
        messages = messages.len(),
        "Converting prompt for provider"
    );

    let payload = match target {
        ProviderTarget::ClaudeText(options) => {
            json!({ "prompt": convert_claude_prompt(messages, options) })
        }
        ProviderTarget::Claude(options) => {
            let mut conversion = convert_claude_messages(messages, options, names, placeholder);
            if let Some(depth) = options.cache_depth {
                let ttl = options.cache_ttl.as_deref().unwrap_or(DEFAULT_CACHE_TTL);
                inject_cache_control(&mut conversion.messages, depth, ttl)?;
            }
            serde_json::to_value(conversion)?
        }
        ProviderTarget::OpenrouterClaude(options) => {
            let mut messages = messages
                .into_iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            if let Some(depth) = options.cache_depth {
                let ttl = options.cache_ttl.as_deref().unwrap_or(DEFAULT_CACHE_TTL);
                inject_openrouter_cache_control(&mut messages, depth, ttl)?;
            }
            json!({ "messages": messages })
        }
        ProviderTarget::Cohere => {
            serde_json::to_value(convert_cohere_messages(messages, names, placeholder))?
        }
        ProviderTarget::Google(options) => {
            serde_json::to_value(convert_google_prompt(messages, options, names))?
        }
        ProviderTarget::Ai21 => {
            json!({ "messages": convert_ai21_messages(messages, names, placeholder) })
        }
        ProviderTarget::Mistral(options) => {
            json!({ "messages": convert_mistral_messages(messages, options, names) })
        }
        ProviderTarget::Xai => json!({ "messages": convert_xai_messages(messages, names) }),
        ProviderTarget::TextCompletion => {
            json!({ "prompt": convert_text_completion_prompt(&messages) })
        }
    };

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_PROMPT_PLACEHOLDER;

    fn names() -> PromptNames {
        PromptNames::resolve(Some("Nia"), Some("Kai"), None)
    }

    fn convert(messages: Vec<ChatMessage>, processing: ProcessingType, target: Value) -> Value {
        let target: ProviderTarget = serde_json::from_value(target).unwrap();
        convert_for_provider(messages, processing, &names(), &target, DEFAULT_PROMPT_PLACEHOLDER).unwrap()
    }

    fn conversation() -> Vec<ChatMessage> {
        vec![
            ChatMessage::system("rules"),
            ChatMessage::user("q1"),
            ChatMessage::assistant("a1"),
            ChatMessage::user("q2"),
            ChatMessage::user("q2b"),
        ]
    }

    #[test]
    fn test_target_deserialization() {
        let target: ProviderTarget =
            serde_json::from_value(json!({"provider": "mistral", "enable_prefix": true})).unwrap();
        assert!(matches!(target, ProviderTarget::Mistral(MistralOptions { enable_prefix: true })));

        let target: ProviderTarget = serde_json::from_value(json!({"provider": "xai"})).unwrap();
        assert_eq!(target.name(), "xai");

        assert!(serde_json::from_value::<ProviderTarget>(json!({"provider": "palm"})).is_err());
    }

    #[test]
    fn test_claude_with_cache_control() {
        let payload = convert(
            conversation(),
            ProcessingType::Merge,
            json!({"provider": "claude", "use_system_prompt": true, "cache_depth": 0, "cache_ttl": "1h"}),
        );
        assert_eq!(payload["system"], json!([{"type": "text", "text": "rules"}]));
        assert_eq!(
            payload["messages"][2],
            json!({"role": "user", "content": [{
                "type": "text",
                "text": "q2\n\nq2b",
                "cache_control": {"type": "ephemeral", "ttl": "1h"}
            }]})
        );
        assert_eq!(
            payload["messages"][0]["content"][0]["cache_control"],
            json!({"type": "ephemeral", "ttl": "1h"})
        );
    }

    #[test]
    fn test_openrouter_claude_default_ttl() {
        let payload = convert(
            conversation(),
            ProcessingType::None,
            json!({"provider": "openrouter_claude", "cache_depth": 0}),
        );
        assert_eq!(
            payload["messages"][4]["content"],
            json!([{"type": "text", "text": "q2b", "cache_control": {"type": "ephemeral", "ttl": "5m"}}])
        );
        assert_eq!(payload["messages"][3]["content"], "q2");
    }

    #[test]
    fn test_payload_shapes() {
        let cases = [
            (json!({"provider": "claude_text"}), "prompt"),
            (json!({"provider": "cohere"}), "chat_history"),
            (json!({"provider": "google"}), "contents"),
            (json!({"provider": "ai21"}), "messages"),
            (json!({"provider": "mistral"}), "messages"),
            (json!({"provider": "xai"}), "messages"),
            (json!({"provider": "text_completion"}), "prompt"),
        ];
        for (target, key) in cases {
            let payload = convert(conversation(), ProcessingType::Strict, target);
            assert!(payload.get(key).is_some(), "missing {key} in {payload}");
        }
    }

    #[test]
    fn test_text_completion_after_strict() {
        let payload = convert(
            vec![ChatMessage::assistant("hi")],
            ProcessingType::Strict,
            json!({"provider": "text_completion"}),
        );
        assert_eq!(
            payload["prompt"],
            format!("user: {DEFAULT_PROMPT_PLACEHOLDER}\nassistant: hi\nassistant:")
        );
    }
}
