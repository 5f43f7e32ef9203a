//! Flattening of multimodal content into strings and back.
//!
//! Squashing works on strings, so every non-text part is swapped for a random
//! token before merging and swapped back afterwards.

use std::collections::HashMap;

use super::common::generate_content_token;
use super::message::{ContentPart, MessageContent};
use crate::constants::SEGMENT_DELIMITER;

/// Token → content part map collected while flattening.
#[derive(Debug, Clone, Default)]
pub struct ContentTokens {
    parts: HashMap<String, ContentPart>,
}

impl ContentTokens {
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn get(&self, token: &str) -> Option<&ContentPart> {
        self.parts.get(token)
    }

    /// Flatten content to a string. Text parts render as their text, media
    /// parts as a fresh token recorded in this map, unsupported parts as `""`.
    pub fn flatten(&mut self, content: MessageContent) -> String {
        match content {
            MessageContent::Text(text) => text,
            MessageContent::Parts(parts) => parts
                .into_iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text,
                    ContentPart::Unsupported => String::new(),
                    media => self.insert(media),
                })
                .collect::<Vec<_>>()
                .join(SEGMENT_DELIMITER),
        }
    }

    fn insert(&mut self, part: ContentPart) -> String {
        let mut token = generate_content_token();
        while self.parts.contains_key(&token) {
            token = generate_content_token();
        }
        self.parts.insert(token.clone(), part);
        token
    }

    /// True if any recorded token occurs in `text`.
    pub fn appears_in(&self, text: &str) -> bool {
        self.parts.keys().any(|token| text.contains(token.as_str()))
    }

    /// Expand tokens in merged text back into content parts.
    ///
    /// Text without any substitution stays a plain string. Adjacent text
    /// segments are re-joined with the blank-line delimiter.
    pub fn expand(&self, text: &str) -> MessageContent {
        if !self.appears_in(text) {
            return MessageContent::Text(text.to_string());
        }

        let mut parts: Vec<ContentPart> = Vec::new();
        for segment in text.split(SEGMENT_DELIMITER) {
            if let Some(part) = self.parts.get(segment) {
                parts.push(part.clone());
            } else if self.appears_in(segment) {
                self.expand_inline(segment, &mut parts);
            } else {
                push_text(&mut parts, segment);
            }
        }
        MessageContent::Parts(parts)
    }

    /// A segment with text glued to a token, e.g. `"Ash: <token>"` after a
    /// name prefix landed on a message that started with an image.
    fn expand_inline(&self, segment: &str, parts: &mut Vec<ContentPart>) {
        let mut rest = segment;
        let mut first = true;
        while let Some((start, token)) = self.find_token(rest) {
            let before = &rest[..start];
            if !before.is_empty() {
                if first {
                    push_text(parts, before);
                } else {
                    parts.push(ContentPart::text(before));
                }
            }
            if let Some(part) = self.parts.get(token) {
                parts.push(part.clone());
            }
            rest = &rest[start + token.len()..];
            first = false;
        }
        if !rest.is_empty() {
            parts.push(ContentPart::text(rest));
        }
    }

    fn find_token<'a>(&'a self, text: &str) -> Option<(usize, &'a str)> {
        self.parts
            .keys()
            .filter_map(|token| text.find(token.as_str()).map(|i| (i, token.as_str())))
            .min_by_key(|(i, _)| *i)
    }
}

/// Append to the trailing text part (restoring the delimiter) or start one.
fn push_text(parts: &mut Vec<ContentPart>, text: &str) {
    if let Some(ContentPart::Text { text: last }) = parts.last_mut() {
        last.push_str(SEGMENT_DELIMITER);
        last.push_str(text);
    } else {
        parts.push(ContentPart::text(text));
    }
}

/// Flatten a single content value with its own token map.
pub fn flatten(content: MessageContent) -> (String, ContentTokens) {
    let mut tokens = ContentTokens::default();
    let text = tokens.flatten(content);
    (text, tokens)
}

/// Inverse of [`flatten`].
pub fn expand(text: &str, tokens: &ContentTokens) -> MessageContent {
    tokens.expand(text)
}
