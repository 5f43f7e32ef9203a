use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;

use prompt_converter::transforms::reasoning::{
    ReasoningEffort, calculate_claude_budget_tokens, calculate_google_budget_tokens,
};
use prompt_converter::transforms::{
    ChatMessage, ProcessingType, PromptNames, ProviderTarget, convert_for_provider,
    post_process_prompt,
};

use super::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub processing: ProcessingType,
    #[serde(flatten)]
    pub names: PromptNames,
}

#[derive(Debug, Deserialize)]
pub struct ConvertRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub processing: ProcessingType,
    #[serde(flatten)]
    pub names: PromptNames,
    pub target: ProviderTarget,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetProvider {
    Claude,
    Google,
}

#[derive(Debug, Deserialize)]
pub struct BudgetRequest {
    pub provider: BudgetProvider,
    pub max_tokens: u32,
    #[serde(default)]
    pub effort: ReasoningEffort,
    #[serde(default)]
    pub stream: bool,
    #[serde(default)]
    pub model: String,
}

/// Fill options the request left unset from server configuration.
fn apply_defaults(target: &mut ProviderTarget, state: &AppState) {
    match target {
        ProviderTarget::Claude(options) => {
            options.cache_ttl.get_or_insert_with(|| state.cache_ttl.clone());
        }
        ProviderTarget::OpenrouterClaude(options) => {
            options.cache_ttl.get_or_insert_with(|| state.cache_ttl.clone());
        }
        ProviderTarget::Mistral(options) => {
            options.enable_prefix |= state.mistral_prefix;
        }
        _ => {}
    }
}

pub async fn process(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    info!(processing = ?req.processing, messages = req.messages.len(), "Processing prompt");

    let messages = post_process_prompt(req.messages, req.processing, &req.names, &state.placeholder);
    Ok(Json(json!({ "messages": messages })))
}

pub async fn convert(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(mut req) = payload?;
    apply_defaults(&mut req.target, &state);
    info!(
        provider = req.target.name(),
        processing = ?req.processing,
        messages = req.messages.len(),
        "Converting prompt"
    );

    let payload = convert_for_provider(
        req.messages,
        req.processing,
        &req.names,
        &req.target,
        &state.placeholder,
    )?;
    Ok(Json(payload))
}

pub async fn reasoning_budget(
    payload: Result<Json<BudgetRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;

    let budget_tokens = match req.provider {
        BudgetProvider::Claude => {
            calculate_claude_budget_tokens(req.max_tokens, req.effort, req.stream).map(i64::from)
        }
        BudgetProvider::Google => {
            calculate_google_budget_tokens(req.max_tokens, req.effort, &req.model)
        }
    };

    Ok(Json(json!({ "budget_tokens": budget_tokens })))
}
