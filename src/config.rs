use std::env;

use dotenvy::dotenv;
use prompt_converter::constants::{DEFAULT_CACHE_TTL, DEFAULT_PROMPT_PLACEHOLDER};

/// CORS configuration mode
#[derive(Debug, Clone)]
pub enum CorsMode {
    /// Only allow localhost origins (default, for local development)
    LocalhostOnly,
    /// Allow all origins
    AllowAll,
    /// Allow specific origins (comma-separated list)
    AllowList(Vec<String>),
}

pub struct Config {
    pub host: String,
    pub port: u16,
    /// Filler user turn for prompts that would otherwise be empty.
    pub placeholder: String,
    /// Send trailing assistant turns to Mistral as prefix continuations.
    pub mistral_prefix: bool,
    /// TTL for cache-control markers when a request does not set one.
    pub cache_ttl: String,
    pub cors_mode: CorsMode,
}

fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let host = env::var("PROMPT_CONVERTER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PROMPT_CONVERTER_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4097);

        let placeholder = env::var("PROMPT_CONVERTER_PLACEHOLDER")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT_PLACEHOLDER.to_string());

        let mistral_prefix = env::var("PROMPT_CONVERTER_MISTRAL_PREFIX")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        let cache_ttl = env::var("PROMPT_CONVERTER_CACHE_TTL")
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_CACHE_TTL.to_string());

        // CORS configuration: "localhost" (default), "*" (allow all), or comma-separated origins
        let cors_mode = match env::var("PROMPT_CONVERTER_CORS_ORIGINS").as_deref() {
            Ok("*") => CorsMode::AllowAll,
            Ok("localhost") => CorsMode::LocalhostOnly,
            Ok(origins) if !origins.is_empty() => {
                CorsMode::AllowList(origins.split(',').map(|s| s.trim().to_string()).collect())
            }
            _ => CorsMode::LocalhostOnly,
        };

        Self {
            host,
            port,
            placeholder,
            mistral_prefix,
            cache_ttl,
            cors_mode,
        }
    }
}
