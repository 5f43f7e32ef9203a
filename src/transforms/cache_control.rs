//! Prompt-caching breakpoints placed by conversation depth.
//!
//! Depth counts role switches from the end of the conversation, not
//! messages. A trailing assistant prefill is skipped and never marked.
//! Markers go on the last block of the message at `depth` and at `depth + 2`.

use serde::Serialize;
use serde_json::{Value, json};

use super::claude::{ClaudeMessage, ClaudeRole};
use crate::error::ConvertError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub kind: String,
    pub ttl: String,
}

impl CacheControl {
    pub fn ephemeral(ttl: impl Into<String>) -> Self {
        Self {
            kind: "ephemeral".to_string(),
            ttl: ttl.into(),
        }
    }
}

/// A message the depth walk can read a role from and mark.
trait CacheTarget {
    fn role(&self) -> &str;
    fn mark_last_block(&mut self, index: usize, cache_control: &CacheControl)
    -> Result<(), ConvertError>;
}

impl CacheTarget for ClaudeMessage {
    fn role(&self) -> &str {
        match self.role {
            ClaudeRole::User => "user",
            ClaudeRole::Assistant => "assistant",
        }
    }

    fn mark_last_block(
        &mut self,
        index: usize,
        cache_control: &CacheControl,
    ) -> Result<(), ConvertError> {
        let block = self
            .content
            .last_mut()
            .ok_or(ConvertError::EmptyContent { index })?;
        block.cache_control = Some(cache_control.clone());
        Ok(())
    }
}

/// OpenAI-shaped passthrough message; bare string content is wrapped first.
impl CacheTarget for Value {
    fn role(&self) -> &str {
        self.get("role").and_then(|r| r.as_str()).unwrap_or("")
    }

    fn mark_last_block(
        &mut self,
        index: usize,
        cache_control: &CacheControl,
    ) -> Result<(), ConvertError> {
        let marker = serde_json::to_value(cache_control)?;
        let content = self
            .get_mut("content")
            .ok_or_else(|| ConvertError::UnexpectedContent {
                index,
                found: "no content field".to_string(),
            })?;

        match content {
            Value::String(text) => {
                *content = json!([{
                    "type": "text",
                    "text": std::mem::take(text),
                    "cache_control": marker
                }]);
                Ok(())
            }
            Value::Array(parts) => match parts.last_mut().and_then(Value::as_object_mut) {
                Some(part) => {
                    part.insert("cache_control".to_string(), marker);
                    Ok(())
                }
                None => Err(ConvertError::UnexpectedContent {
                    index,
                    found: "empty or non-object content array".to_string(),
                }),
            },
            other => Err(ConvertError::UnexpectedContent {
                index,
                found: other.to_string(),
            }),
        }
    }
}

fn inject<T: CacheTarget>(messages: &mut [T], depth: usize, ttl: &str) -> Result<(), ConvertError> {
    let cache_control = CacheControl::ephemeral(ttl);
    let mut passed_prefill = false;
    let mut current_depth = 0;
    let mut previous_role = String::new();

    for index in (0..messages.len()).rev() {
        let message = &mut messages[index];
        if !passed_prefill && message.role() == "assistant" {
            continue;
        }
        passed_prefill = true;

        if message.role() == previous_role {
            continue;
        }

        if current_depth == depth || current_depth == depth + 2 {
            message.mark_last_block(index, &cache_control)?;
        }
        if current_depth == depth + 2 {
            break;
        }
        current_depth += 1;
        previous_role = message.role().to_string();
    }

    Ok(())
}

/// Mark Claude Messages API turns for caching at `depth` role switches.
pub fn inject_cache_control(
    messages: &mut [ClaudeMessage],
    depth: usize,
    ttl: &str,
) -> Result<(), ConvertError> {
    inject(messages, depth, ttl)
}

/// Same walk for OpenRouter's Claude passthrough, where `content` may still
/// be a plain string.
pub fn inject_openrouter_cache_control(
    messages: &mut [Value],
    depth: usize,
    ttl: &str,
) -> Result<(), ConvertError> {
    inject(messages, depth, ttl)
}
