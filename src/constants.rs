/// Filler user turn inserted wherever a provider would otherwise see an empty
/// prompt or a broken alternation.
pub const DEFAULT_PROMPT_PLACEHOLDER: &str = "Let's get started.";

/// Separator used when squashing message contents and flattening content parts.
pub const SEGMENT_DELIMITER: &str = "\n\n";

/// Reserved speaker label for one-shot example turns written as the user.
pub const EXAMPLE_USER: &str = "example_user";

/// Reserved speaker label for one-shot example turns written as the character.
pub const EXAMPLE_ASSISTANT: &str = "example_assistant";

/// Default prompt-cache lifetime for `cache_control` markers.
pub const DEFAULT_CACHE_TTL: &str = "5m";

/// Stand-in text Cohere needs ahead of a tool call when no assistant text precedes it.
pub const COHERE_TOOL_CALL_PRIMER: &str = "I'm going to call a tool for that";

/// Length of the hashed tool-call ids Mistral accepts.
pub const MISTRAL_TOOL_ID_LEN: usize = 9;

// ============================================================================
// Reasoning budgets
// ============================================================================

/// Smallest thinking budget Claude accepts.
pub const CLAUDE_MIN_BUDGET: u32 = 1024;

/// Largest thinking budget Claude accepts on non-streaming requests.
pub const CLAUDE_MAX_NON_STREAM_BUDGET: u32 = 21333;

/// Thinking budget ceiling for Gemini flash and flash-lite models.
pub const GOOGLE_FLASH_MAX_BUDGET: u32 = 24576;

/// Thinking budget floor for Gemini flash-lite models when thinking is on.
pub const GOOGLE_FLASH_LITE_MIN_BUDGET: u32 = 512;

/// Thinking budget floor for Gemini pro models (thinking cannot be turned off).
pub const GOOGLE_PRO_MIN_BUDGET: u32 = 128;

/// Thinking budget ceiling for Gemini pro models.
pub const GOOGLE_PRO_MAX_BUDGET: u32 = 32768;

/// Google's sentinel for "let the model decide".
pub const GOOGLE_DYNAMIC_BUDGET: i64 = -1;
