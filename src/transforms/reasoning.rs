//! Reasoning effort → thinking budget mapping for Claude and Gemini.
//!
//! The clamps are provider limits: Claude rejects budgets under 1024 and,
//! without streaming, over 21333. Gemini limits depend on the model family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::constants::{
    CLAUDE_MAX_NON_STREAM_BUDGET, CLAUDE_MIN_BUDGET, GOOGLE_DYNAMIC_BUDGET,
    GOOGLE_FLASH_LITE_MIN_BUDGET, GOOGLE_FLASH_MAX_BUDGET, GOOGLE_PRO_MAX_BUDGET,
    GOOGLE_PRO_MIN_BUDGET,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ReasoningEffort {
    #[default]
    Auto,
    Min,
    Low,
    Medium,
    High,
    Max,
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown reasoning effort: {0}")]
pub struct ParseEffortError(String);

impl FromStr for ReasoningEffort {
    type Err = ParseEffortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "min" | "minimal" => Ok(Self::Min),
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "max" | "xhigh" => Ok(Self::Max),
            _ => Err(ParseEffortError(s.to_string())),
        }
    }
}

impl TryFrom<String> for ReasoningEffort {
    type Error = ParseEffortError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ReasoningEffort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Auto => "auto",
            Self::Min => "min",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Max => "max",
        };
        f.write_str(s)
    }
}

fn fraction(max_tokens: u32, ratio: f64) -> u32 {
    (f64::from(max_tokens) * ratio).floor() as u32
}

/// Claude `budget_tokens` for an effort level; `None` lets the caller skip
/// the thinking block's explicit budget.
pub fn calculate_claude_budget_tokens(
    max_tokens: u32,
    effort: ReasoningEffort,
    stream: bool,
) -> Option<u32> {
    let budget = match effort {
        ReasoningEffort::Auto => return None,
        ReasoningEffort::Min => CLAUDE_MIN_BUDGET,
        ReasoningEffort::Low => fraction(max_tokens, 0.1),
        ReasoningEffort::Medium => fraction(max_tokens, 0.25),
        ReasoningEffort::High => fraction(max_tokens, 0.5),
        ReasoningEffort::Max => fraction(max_tokens, 0.95),
    };

    let budget = budget.max(CLAUDE_MIN_BUDGET);
    if stream {
        Some(budget)
    } else {
        Some(budget.min(CLAUDE_MAX_NON_STREAM_BUDGET))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GeminiFamily {
    FlashLite,
    Flash,
    Pro,
}

impl GeminiFamily {
    fn detect(model: &str) -> Option<Self> {
        if model.contains("flash-lite") {
            Some(Self::FlashLite)
        } else if model.contains("flash") {
            Some(Self::Flash)
        } else if model.contains("pro") {
            Some(Self::Pro)
        } else {
            None
        }
    }
}

/// Gemini `thinkingBudget` for an effort level. `auto` is always `-1`
/// (dynamic); `None` means the model family has no known thinking budget.
pub fn calculate_google_budget_tokens(
    max_tokens: u32,
    effort: ReasoningEffort,
    model: &str,
) -> Option<i64> {
    if effort == ReasoningEffort::Auto {
        return Some(GOOGLE_DYNAMIC_BUDGET);
    }

    let Some(family) = GeminiFamily::detect(model) else {
        warn!(model, "Unknown Gemini model family, not setting a thinking budget");
        return None;
    };

    let scaled = match effort {
        ReasoningEffort::Low => fraction(max_tokens, 0.1),
        ReasoningEffort::Medium => fraction(max_tokens, 0.25),
        ReasoningEffort::High => fraction(max_tokens, 0.5),
        _ => max_tokens,
    };

    let budget = match family {
        GeminiFamily::Flash => match effort {
            ReasoningEffort::Min => 0,
            _ => scaled.min(GOOGLE_FLASH_MAX_BUDGET),
        },
        GeminiFamily::FlashLite => match effort {
            ReasoningEffort::Min => 0,
            _ => scaled.clamp(GOOGLE_FLASH_LITE_MIN_BUDGET, GOOGLE_FLASH_MAX_BUDGET),
        },
        GeminiFamily::Pro => match effort {
            ReasoningEffort::Min => GOOGLE_PRO_MIN_BUDGET,
            _ => scaled.clamp(GOOGLE_PRO_MIN_BUDGET, GOOGLE_PRO_MAX_BUDGET),
        },
    };

    Some(i64::from(budget))
}

/// Claude `thinking` request field, or `None` when no budget applies.
pub fn claude_thinking_config(max_tokens: u32, effort: ReasoningEffort, stream: bool) -> Option<Value> {
    calculate_claude_budget_tokens(max_tokens, effort, stream).map(|budget_tokens| {
        json!({
            "type": "enabled",
            "budget_tokens": budget_tokens
        })
    })
}

/// Gemini `generationConfig.thinkingConfig` field.
pub fn google_thinking_config(
    max_tokens: u32,
    effort: ReasoningEffort,
    model: &str,
    include_thoughts: bool,
) -> Option<Value> {
    calculate_google_budget_tokens(max_tokens, effort, model).map(|budget| {
        json!({
            "thinkingBudget": budget,
            "includeThoughts": include_thoughts
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_effort() {
        assert_eq!("minimal".parse::<ReasoningEffort>().unwrap(), ReasoningEffort::Min);
        assert_eq!("MED".parse::<ReasoningEffort>().unwrap(), ReasoningEffort::Medium);
        assert_eq!("xhigh".parse::<ReasoningEffort>().unwrap(), ReasoningEffort::Max);
        assert!("extreme".parse::<ReasoningEffort>().is_err());

        let effort: ReasoningEffort = serde_json::from_str("\"High\"").unwrap();
        assert_eq!(effort, ReasoningEffort::High);
        assert_eq!(serde_json::to_string(&ReasoningEffort::Low).unwrap(), "\"low\"");
        assert!(ReasoningEffort::Min < ReasoningEffort::Max);
    }

    #[test]
    fn test_claude_budget() {
        assert_eq!(calculate_claude_budget_tokens(8000, ReasoningEffort::Auto, true), None);
        assert_eq!(calculate_claude_budget_tokens(8000, ReasoningEffort::Min, true), Some(1024));
        assert_eq!(calculate_claude_budget_tokens(20000, ReasoningEffort::Low, true), Some(2000));
        assert_eq!(calculate_claude_budget_tokens(20000, ReasoningEffort::Medium, true), Some(5000));
        assert_eq!(calculate_claude_budget_tokens(20000, ReasoningEffort::High, true), Some(10000));
        assert_eq!(calculate_claude_budget_tokens(20000, ReasoningEffort::Max, true), Some(19000));
        assert_eq!(calculate_claude_budget_tokens(100_000, ReasoningEffort::Max, true), Some(95000));
    }

    #[test]
    fn test_claude_budget_clamps() {
        assert_eq!(calculate_claude_budget_tokens(100, ReasoningEffort::Low, true), Some(1024));
        assert_eq!(calculate_claude_budget_tokens(100, ReasoningEffort::Max, false), Some(1024));
        assert_eq!(
            calculate_claude_budget_tokens(100_000, ReasoningEffort::Max, false),
            Some(21333)
        );
        for effort in [
            ReasoningEffort::Min,
            ReasoningEffort::Low,
            ReasoningEffort::Medium,
            ReasoningEffort::High,
            ReasoningEffort::Max,
        ] {
            for max_tokens in [0, 100, 4096, 64_000, 1_000_000] {
                let budget = calculate_claude_budget_tokens(max_tokens, effort, false).unwrap();
                assert!((CLAUDE_MIN_BUDGET..=CLAUDE_MAX_NON_STREAM_BUDGET).contains(&budget));
            }
        }
    }

    #[test]
    fn test_google_auto_is_dynamic() {
        for model in ["gemini-2.5-flash", "gemini-2.5-pro", "gemma-3"] {
            assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Auto, model), Some(-1));
        }
    }

    #[test]
    fn test_google_flash() {
        let model = "gemini-2.5-flash";
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Min, model), Some(0));
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Low, model), Some(800));
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Max, model), Some(8000));
        assert_eq!(calculate_google_budget_tokens(100_000, ReasoningEffort::Max, model), Some(24576));
        assert_eq!(calculate_google_budget_tokens(100, ReasoningEffort::Low, model), Some(10));
    }

    #[test]
    fn test_google_flash_lite() {
        let model = "gemini-2.5-flash-lite-preview";
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Min, model), Some(0));
        assert_eq!(calculate_google_budget_tokens(1000, ReasoningEffort::Low, model), Some(512));
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Medium, model), Some(2000));
        assert_eq!(calculate_google_budget_tokens(100_000, ReasoningEffort::High, model), Some(24576));
    }

    #[test]
    fn test_google_pro() {
        let model = "gemini-2.5-pro";
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::Min, model), Some(128));
        assert_eq!(calculate_google_budget_tokens(1000, ReasoningEffort::Low, model), Some(128));
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::High, model), Some(4000));
        assert_eq!(calculate_google_budget_tokens(100_000, ReasoningEffort::Max, model), Some(32768));
    }

    #[test]
    fn test_google_unknown_family() {
        assert_eq!(calculate_google_budget_tokens(8000, ReasoningEffort::High, "gemma-3-27b"), None);
    }

    #[test]
    fn test_thinking_configs() {
        assert_eq!(
            claude_thinking_config(20000, ReasoningEffort::Medium, true),
            Some(json!({"type": "enabled", "budget_tokens": 5000}))
        );
        assert_eq!(claude_thinking_config(20000, ReasoningEffort::Auto, true), None);
        assert_eq!(
            google_thinking_config(8000, ReasoningEffort::Auto, "gemini-2.5-pro", true),
            Some(json!({"thinkingBudget": -1, "includeThoughts": true}))
        );
    }
}
