use std::{env, str::FromStr, time::Duration};

use log::{debug, error, info};

use crate::error::{BotError, Result};

const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_HISTORY_LENGTH: usize = 20;
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const MALFORMED_TOKEN: &str =
    "DISCORD_TOKEN is malformed; expected a bot token copied from the Discord developer portal";

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful Discord bot assistant. \
You engage in natural conversations and help users with various tasks.

Response guidelines:
- Give detailed, well organized answers with examples where they help
- Break complex topics into easy-to-understand parts
- Stay conversational and friendly

Content guidelines:
- Keep every response appropriate for a PG-13 audience
- Do not use profanity, explicit language or crude humor
- Politely decline inappropriate requests and redirect the conversation";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub system_prompt: String,
    pub max_history_length: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or any value is malformed.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| env::var(key).ok());
        if let Err(e) = &config {
            error!("Failed to load configuration: {e}");
        }
        config
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or any value is malformed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let discord_token = required(&lookup, "DISCORD_TOKEN")?;
        validate_discord_token(&discord_token)?;

        let openai_api_key = required(&lookup, "OPENAI_API_KEY")?;
        if openai_api_key.chars().any(char::is_whitespace) {
            return Err(BotError::Config(
                "OPENAI_API_KEY must not contain whitespace".to_string(),
            ));
        }

        let openai_model = optional(&lookup, "OPENAI_MODEL")
            .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string());
        let openai_base_url = optional(&lookup, "OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let system_prompt = optional(&lookup, "SYSTEM_PROMPT")
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let max_history_length =
            parse_positive(&lookup, "MAX_HISTORY_LENGTH", DEFAULT_MAX_HISTORY_LENGTH)?;
        let max_tokens = parse_positive(&lookup, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?;

        let temperature = parse_or(&lookup, "TEMPERATURE", DEFAULT_TEMPERATURE)?;
        if !(0.0..=2.0).contains(&temperature) {
            return Err(BotError::Config(format!(
                "TEMPERATURE must be between 0 and 2, got {temperature}"
            )));
        }

        let timeout_secs =
            parse_positive(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;

        info!("Configuration loaded successfully");
        debug!("Discord token length: {} characters", discord_token.len());
        debug!("OpenAI API key length: {} characters", openai_api_key.len());
        debug!("OpenAI model: {openai_model}");
        debug!("OpenAI base URL: {openai_base_url}");
        debug!("System prompt length: {} characters", system_prompt.len());
        debug!("Max history length: {max_history_length} turns");
        debug!("Request timeout: {timeout_secs}s");

        Ok(Self {
            discord_token,
            openai_api_key,
            openai_model,
            openai_base_url,
            system_prompt,
            max_history_length,
            max_tokens,
            temperature,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key).ok_or_else(|| {
        BotError::Config(format!(
            "{key} is not set. Add it to the environment or to a .env file."
        ))
    })
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional(lookup, key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| BotError::Config(format!("{key} has invalid value '{raw}': {e}"))),
        None => Ok(default),
    }
}

fn parse_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    let value = parse_or(lookup, key, default)?;
    if value == T::default() {
        return Err(BotError::Config(format!("{key} must be at least 1")));
    }
    Ok(value)
}

/// Discord bot tokens are three non-empty, dot-separated segments.
fn validate_discord_token(token: &str) -> Result<()> {
    let well_formed = !token.chars().any(char::is_whitespace)
        && token.split('.').count() == 3
        && token.split('.').all(|segment| !segment.is_empty());

    if well_formed {
        Ok(())
    } else {
        Err(BotError::Config(MALFORMED_TOKEN.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const TOKEN: &str = "MTIzNDU2Nzg5MDEyMzQ1Njc4.GaBcDe.abcdefghijklmnopqrstuvwxyz0123456789";

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn loads_defaults_with_required_keys() -> Result<()> {
        let config = load(&[("DISCORD_TOKEN", TOKEN), ("OPENAI_API_KEY", "sk-test")])?;

        assert_eq!(config.openai_model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.max_history_length, DEFAULT_MAX_HISTORY_LENGTH);
        assert_eq!(config.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.system_prompt.contains("PG-13"));
        Ok(())
    }

    #[test]
    fn missing_discord_token_fails() {
        let err = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let result = load(&[("DISCORD_TOKEN", TOKEN), ("OPENAI_API_KEY", "  ")]);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn malformed_discord_token_fails() {
        for token in ["not-a-token", "a..c", "a.b.c.d", "a b.c.d"] {
            let result = load(&[("DISCORD_TOKEN", token), ("OPENAI_API_KEY", "sk")]);
            assert!(result.is_err(), "token {token:?} should be rejected");
        }
    }

    #[test]
    fn overrides_are_parsed() -> Result<()> {
        let config = load(&[
            ("DISCORD_TOKEN", TOKEN),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
            ("MAX_HISTORY_LENGTH", "10"),
            ("TEMPERATURE", "0.2"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])?;

        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.openai_base_url, "http://localhost:8080/v1");
        assert_eq!(config.max_history_length, 10);
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        Ok(())
    }

    #[test]
    fn zero_history_length_is_rejected() {
        let err = load(&[
            ("DISCORD_TOKEN", TOKEN),
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_HISTORY_LENGTH", "0"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("MAX_HISTORY_LENGTH"));
    }

    #[test]
    fn non_numeric_history_length_is_rejected() {
        let result = load(&[
            ("DISCORD_TOKEN", TOKEN),
            ("OPENAI_API_KEY", "sk-test"),
            ("MAX_HISTORY_LENGTH", "lots"),
        ]);
        assert!(matches!(result, Err(BotError::Config(_))));
    }
}
