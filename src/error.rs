use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Serenity error: {0}")]
    Serenity(Box<poise::serenity_prelude::Error>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl From<poise::serenity_prelude::Error> for BotError {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        BotError::Serenity(Box::new(err))
    }
}

/// Failure classes reported by the chat completion client.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// The API rejected our credentials.
    #[error("completion API rejected credentials ({status}): {message}")]
    Auth { status: StatusCode, message: String },

    /// Billing quota or rate limit exhausted.
    #[error("completion API quota exhausted ({status}): {message}")]
    Quota { status: StatusCode, message: String },

    /// Network timeout, connection failure or 5xx response.
    #[error("transient completion failure: {0}")]
    Transient(String),

    #[error("unexpected completion failure: {0}")]
    Unexpected(String),
}

impl CompletionError {
    /// Returns a user-friendly error message suitable for displaying in Discord.
    ///
    /// Never includes the underlying error text.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            CompletionError::Auth { .. } => {
                "Sorry, I'm having authentication issues with my AI service. \
                 Please contact the bot administrator."
            }
            CompletionError::Quota { .. } => {
                "Sorry, my AI service is out of quota right now. \
                 Please let the bot administrator know, or try again later."
            }
            CompletionError::Transient(_) => {
                "Sorry, the AI service is having a hiccup. \
                 Please send your message again in a moment."
            }
            CompletionError::Unexpected(_) => {
                "Sorry, something went wrong while generating a reply. Please try again."
            }
        }
    }
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            CompletionError::Transient(err.to_string())
        } else {
            CompletionError::Unexpected(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_never_leak_details() {
        let secret = "sk-live-very-secret";
        let errors = [
            CompletionError::Auth {
                status: StatusCode::UNAUTHORIZED,
                message: secret.to_string(),
            },
            CompletionError::Quota {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: secret.to_string(),
            },
            CompletionError::Transient(secret.to_string()),
            CompletionError::Unexpected(secret.to_string()),
        ];

        for err in &errors {
            assert!(!err.user_message().contains(secret));
            assert!(err.user_message().starts_with("Sorry"));
        }
    }
}
