//! Speaker names for a single conversion request.

use serde::Deserialize;

/// Character, user and group-member names used for inline name prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PromptNames {
    #[serde(default)]
    pub char_name: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub group_names: Vec<String>,
}

impl PromptNames {
    /// Build from raw request values; anything unset becomes empty.
    pub fn resolve(
        char_name: Option<&str>,
        user_name: Option<&str>,
        group_names: Option<&[String]>,
    ) -> Self {
        Self {
            char_name: char_name.unwrap_or_default().to_string(),
            user_name: user_name.unwrap_or_default().to_string(),
            group_names: group_names.map(<[String]>::to_vec).unwrap_or_default(),
        }
    }

    /// True if `text` starts with `"<member>: "` for any group member.
    pub fn starts_with_group_name(&self, text: &str) -> bool {
        self.group_names
            .iter()
            .any(|name| has_name_prefix(text, name))
    }

    /// Prefix with the character name unless the text already carries it
    /// or a group member's prefix.
    pub fn prefix_char_name(&self, text: &str) -> String {
        if self.char_name.is_empty()
            || has_name_prefix(text, &self.char_name)
            || self.starts_with_group_name(text)
        {
            return text.to_string();
        }
        format!("{}: {}", self.char_name, text)
    }

    /// Prefix with the user name unless already present.
    pub fn prefix_user_name(&self, text: &str) -> String {
        if self.user_name.is_empty() {
            return text.to_string();
        }
        prefix_name(&self.user_name, text)
    }
}

pub fn has_name_prefix(text: &str, name: &str) -> bool {
    text.strip_prefix(name)
        .is_some_and(|rest| rest.starts_with(": "))
}

/// `"<name>: <text>"`, unless `name` is empty or `text` already starts that way.
pub fn prefix_name(name: &str, text: &str) -> String {
    if name.is_empty() || has_name_prefix(text, name) {
        text.to_string()
    } else {
        format!("{name}: {text}")
    }
}
