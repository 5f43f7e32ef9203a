//! Claude prompt conversion.
//!
//! This module provides:
//! - `convert_claude_prompt`: legacy `\n\nHuman:` / `\n\nAssistant:` text completion prompt
//! - `convert_claude_messages`: Messages API content blocks with a separate system prompt

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::cache_control::CacheControl;
use super::common::{parse_data_uri, prefix_example, try_parse};
use super::message::{ChatMessage, ContentPart, MessageContent, Role};
use super::names::{PromptNames, prefix_name};
use crate::constants::{EXAMPLE_ASSISTANT, EXAMPLE_USER};

// ============================================================================
// Claude Messages API Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaudeRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaudeMessage {
    pub role: ClaudeRole,
    pub content: Vec<ClaudeBlock>,
}

/// A content block plus its optional prompt-caching marker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaudeBlock {
    #[serde(flatten)]
    pub kind: ClaudeBlockKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_control: Option<CacheControl>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClaudeBlockKind {
    Text {
        text: String,
    },
    Image {
        source: ImageSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSource {
    #[serde(rename = "type")]
    pub kind: String,
    pub media_type: String,
    pub data: String,
}

impl ClaudeBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ClaudeBlockKind::Text { text: text.into() }.into()
    }

    pub fn is_image(&self) -> bool {
        matches!(self.kind, ClaudeBlockKind::Image { .. })
    }
}

impl From<ClaudeBlockKind> for ClaudeBlock {
    fn from(kind: ClaudeBlockKind) -> Self {
        Self {
            kind,
            cache_control: None,
        }
    }
}

/// Result of converting a prompt for the Messages API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaudeConversion {
    pub messages: Vec<ClaudeMessage>,
    pub system: Vec<ClaudeBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClaudeMessagesOptions {
    /// Move leading system messages into the top-level `system` field.
    pub use_system_prompt: bool,
    /// Keep `tool_use` / `tool_result` blocks instead of flattening them to text.
    pub use_tools: bool,
    /// Trailing assistant text the model continues from.
    pub prefill: Option<String>,
    /// Role-transition depth for prompt-caching markers.
    pub cache_depth: Option<usize>,
    pub cache_ttl: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClaudeTextOptions {
    /// Append an assistant turn (with `assistant_prefill`) to cue the reply.
    pub add_assistant_postfix: bool,
    pub assistant_prefill: Option<String>,
    /// Model accepts a leading system prompt without a `Human:` prefix.
    pub with_sys_prompt_support: bool,
    pub use_system_prompt: bool,
    /// Human turn inserted before the first assistant turn when none precedes it.
    pub human_sys_message: Option<String>,
    /// Render everything but the last message without Human/Assistant prefixes.
    pub exclude_prefixes: bool,
}

// ============================================================================
// Messages API conversion
// ============================================================================

/// Convert a prompt to Claude Messages API format.
///
/// This function handles:
/// - Leading system messages → `system` blocks (when enabled)
/// - Remaining system messages → user turns, example names inlined
/// - `tool_calls` → `tool_use` blocks, tool results → user `tool_result` blocks
/// - Images → base64 `image` blocks, moved off assistant turns
/// - Block-level merging of adjacent same-role turns
/// - Trailing prefill (trailing whitespace removed)
pub fn convert_claude_messages(
    messages: Vec<ChatMessage>,
    options: &ClaudeMessagesOptions,
    names: &PromptNames,
    placeholder: &str,
) -> ClaudeConversion {
    let mut messages = messages.into_iter().peekable();
    let mut system: Vec<ClaudeBlock> = Vec::new();

    if options.use_system_prompt {
        while let Some(message) = messages.next_if(|m| m.role == Role::System) {
            let text = prefix_example(message.name.as_deref(), &message.content.text(), names);
            if !text.is_empty() {
                system.push(ClaudeBlock::text(text));
            }
        }
    }

    let mut converted: Vec<ClaudeMessage> = messages
        .map(|message| convert_message(message, names))
        .collect();

    if converted.is_empty() {
        converted.push(ClaudeMessage {
            role: ClaudeRole::User,
            content: vec![ClaudeBlock::text(placeholder)],
        });
    }

    let mut converted = merge_adjacent(converted);
    if !options.use_tools {
        for message in converted.iter_mut() {
            flatten_tool_blocks(&mut message.content);
        }
    }
    let mut converted = merge_adjacent(relocate_assistant_images(converted));

    if let Some(prefill) = options.prefill.as_deref().map(str::trim_end)
        && !prefill.is_empty()
    {
        let block = ClaudeBlock::text(prefill);
        match converted.last_mut() {
            Some(last) if last.role == ClaudeRole::Assistant => last.content.push(block),
            _ => converted.push(ClaudeMessage {
                role: ClaudeRole::Assistant,
                content: vec![block],
            }),
        }
    }

    debug!(
        messages = converted.len(),
        system_blocks = system.len(),
        "Converted prompt to Claude messages"
    );

    ClaudeConversion {
        messages: converted,
        system,
    }
}

fn convert_message(message: ChatMessage, names: &PromptNames) -> ClaudeMessage {
    match message.role {
        Role::Tool => ClaudeMessage {
            role: ClaudeRole::User,
            content: vec![
                ClaudeBlockKind::ToolResult {
                    tool_use_id: message.tool_call_id.unwrap_or_default(),
                    content: message.content.text(),
                }
                .into(),
            ],
        },
        Role::System => {
            let mut content = message.content;
            let name = message.name;
            content.map_text(|text| prefix_example(name.as_deref(), text, names));
            ClaudeMessage {
                role: ClaudeRole::User,
                content: convert_content(content),
            }
        }
        Role::User | Role::Assistant => {
            let mut content = message.content;
            if let Some(name) = message.name.as_deref() {
                content.map_text(|text| prefix_name(name, text));
            }
            let mut blocks = convert_content(content);
            if message.role == Role::Assistant
                && let Some(calls) = message.tool_calls
            {
                blocks.retain(|b| !matches!(&b.kind, ClaudeBlockKind::Text { text } if text.is_empty()));
                blocks.extend(calls.into_iter().map(|call| {
                    ClaudeBlock::from(ClaudeBlockKind::ToolUse {
                        input: try_parse(&call.function.arguments),
                        id: call.id,
                        name: call.function.name,
                    })
                }));
                if blocks.is_empty() {
                    blocks.push(ClaudeBlock::text(""));
                }
            }
            let role = if message.role == Role::Assistant {
                ClaudeRole::Assistant
            } else {
                ClaudeRole::User
            };
            ClaudeMessage {
                role,
                content: blocks,
            }
        }
    }
}

fn convert_content(content: MessageContent) -> Vec<ClaudeBlock> {
    let mut result = Vec::new();

    match content {
        MessageContent::Text(text) => result.push(ClaudeBlock::text(text)),
        MessageContent::Parts(parts) => {
            for part in parts {
                match part {
                    ContentPart::Text { text } => {
                        if !text.is_empty() {
                            result.push(ClaudeBlock::text(text));
                        }
                    }
                    ContentPart::ImageUrl { image_url } => match parse_data_uri(&image_url.url) {
                        Some((media_type, data)) => result.push(
                            ClaudeBlockKind::Image {
                                source: ImageSource {
                                    kind: "base64".to_string(),
                                    media_type,
                                    data,
                                },
                            }
                            .into(),
                        ),
                        None => warn!("Dropping image that is not a data URI"),
                    },
                    ContentPart::VideoUrl { .. } => debug!("Claude does not accept video, dropping part"),
                    ContentPart::Unsupported => {}
                }
            }
        }
    }

    // Ensure non-empty content
    if result.is_empty() {
        result.push(ClaudeBlock::text(""));
    }

    result
}

/// Merge adjacent same-role messages at the block level.
fn merge_adjacent(messages: Vec<ClaudeMessage>) -> Vec<ClaudeMessage> {
    let mut merged: Vec<ClaudeMessage> = Vec::with_capacity(messages.len());
    for message in messages {
        match merged.last_mut() {
            Some(last) if last.role == message.role => last.content.extend(message.content),
            _ => merged.push(message),
        }
    }
    merged
}

/// Without tool support, render tool blocks as plain text.
fn flatten_tool_blocks(blocks: &mut [ClaudeBlock]) {
    for block in blocks.iter_mut() {
        let text = match &block.kind {
            ClaudeBlockKind::ToolUse { input, .. } => input.to_string(),
            ClaudeBlockKind::ToolResult { content, .. } => content.clone(),
            _ => continue,
        };
        block.kind = ClaudeBlockKind::Text { text };
    }
}

/// Claude rejects images on assistant turns: move them to the end of the
/// next user turn, after any `tool_result` blocks, or into a new user turn
/// right after the assistant.
fn relocate_assistant_images(messages: Vec<ClaudeMessage>) -> Vec<ClaudeMessage> {
    let mut result: Vec<ClaudeMessage> = Vec::with_capacity(messages.len());
    let mut pending: Vec<ClaudeBlock> = Vec::new();

    for mut message in messages {
        match message.role {
            ClaudeRole::Assistant => {
                if !pending.is_empty() {
                    result.push(ClaudeMessage {
                        role: ClaudeRole::User,
                        content: std::mem::take(&mut pending),
                    });
                }
                let (images, rest): (Vec<_>, Vec<_>) =
                    message.content.into_iter().partition(ClaudeBlock::is_image);
                pending = images;
                if !rest.is_empty() {
                    message.content = rest;
                    result.push(message);
                }
            }
            ClaudeRole::User => {
                message.content.append(&mut pending);
                result.push(message);
            }
        }
    }

    if !pending.is_empty() {
        result.push(ClaudeMessage {
            role: ClaudeRole::User,
            content: pending,
        });
    }

    result
}

// ============================================================================
// Legacy text completion prompt
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Turn {
    System,
    Human,
    Assistant,
    /// Human turn right before the first assistant turn, out of order.
    FirstMessage,
}

struct TextTurn {
    turn: Turn,
    name: Option<String>,
    text: String,
}

/// Convert a prompt to a single `\n\nHuman:` / `\n\nAssistant:` string.
pub fn convert_claude_prompt(messages: Vec<ChatMessage>, options: &ClaudeTextOptions) -> String {
    let mut turns: Vec<TextTurn> = messages
        .into_iter()
        .map(|m| TextTurn {
            turn: match m.role {
                Role::System => Turn::System,
                Role::Assistant => Turn::Assistant,
                Role::User | Role::Tool => Turn::Human,
            },
            text: m.content.text(),
            name: m.name,
        })
        .collect();

    if !turns.is_empty() {
        if options.exclude_prefixes {
            let last = turns.len() - 1;
            for turn in &mut turns[..last] {
                turn.turn = Turn::System;
            }
        } else {
            turns[0].turn = Turn::System;
        }

        if options.add_assistant_postfix {
            let prefill = options.assistant_prefill.as_deref().unwrap_or_default();
            turns.push(TextTurn {
                turn: Turn::Assistant,
                name: None,
                text: prefill.trim_end().to_string(),
            });
        }

        let mut has_human = false;
        let mut first_assistant = None;
        for (i, turn) in turns.iter().enumerate() {
            if turn.turn == Turn::Human || turn.text.contains("\n\nHuman: ") {
                has_human = true;
            }
            if turn.turn == Turn::Assistant && i > 0 {
                first_assistant = Some(i);
                break;
            }
        }

        if options.with_sys_prompt_support && options.use_system_prompt {
            turns[0].turn = Turn::System;
            if let Some(index) = first_assistant
                && !has_human
                && let Some(human) = options.human_sys_message.as_deref().filter(|h| !h.is_empty())
            {
                turns.insert(
                    index,
                    TextTurn {
                        turn: Turn::Human,
                        name: None,
                        text: human.to_string(),
                    },
                );
            }
        } else {
            turns[0].turn = Turn::Human;
            if let Some(index) = first_assistant
                && !options.exclude_prefixes
                && index - 1 != 0
                && turns[index - 1].turn == Turn::Human
            {
                turns[index - 1].turn = Turn::FirstMessage;
            }
        }
    }

    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let prefix = match turn.turn {
                Turn::Assistant => "\n\nAssistant: ".to_string(),
                Turn::Human => "\n\nHuman: ".to_string(),
                Turn::FirstMessage => "\n\nFirst message: ".to_string(),
                Turn::System if i == 0 => String::new(),
                Turn::System => match turn.name.as_deref() {
                    Some(EXAMPLE_ASSISTANT) => "\n\nA: ".to_string(),
                    Some(EXAMPLE_USER) => "\n\nH: ".to_string(),
                    Some(name) if options.exclude_prefixes => format!("\n\n{name}: "),
                    _ => "\n\n".to_string(),
                },
            };
            let speaker = match (&turn.name, turn.turn) {
                (Some(name), kind) if kind != Turn::System => format!("{name}: "),
                _ => String::new(),
            };
            format!("{prefix}{speaker}{}", turn.text)
        })
        .collect()
}
