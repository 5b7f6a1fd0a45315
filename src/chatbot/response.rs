//! Response sending utilities for Discord.

use log::{info, warn};
use poise::serenity_prelude::{Context, Message as SerenityMessage};

use crate::error::Result;

/// Discord's message limit for standard users, in characters.
const DISCORD_MESSAGE_LIMIT: usize = 2000;

const ELLIPSIS: char = '…';

/// Shorten text to fit in one Discord message, cutting on a character boundary.
#[must_use]
pub fn fit_message_limit(text: &str) -> String {
    if text.chars().count() <= DISCORD_MESSAGE_LIMIT {
        return text.to_string();
    }

    let mut truncated: String = text.chars().take(DISCORD_MESSAGE_LIMIT - 1).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Send the chatbot's single reply to the originating message.
pub async fn send_reply(ctx: &Context, new_message: &SerenityMessage, text: &str) -> Result<()> {
    let content = fit_message_limit(text);
    if content.len() != text.len() {
        warn!(
            "Reply to {} truncated to {} characters",
            new_message.author.tag(),
            DISCORD_MESSAGE_LIMIT
        );
    }

    new_message.reply(&ctx.http, &content).await?;
    info!(
        "Replied to {} in channel {}: {}",
        new_message.author.tag(),
        new_message.channel_id,
        content
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(fit_message_limit("hello"), "hello");
    }

    #[test]
    fn exact_limit_is_unchanged() {
        let text = "x".repeat(DISCORD_MESSAGE_LIMIT);
        assert_eq!(fit_message_limit(&text), text);
    }

    #[test]
    fn long_text_is_truncated_with_ellipsis() {
        let text = "é".repeat(DISCORD_MESSAGE_LIMIT + 50);
        let fitted = fit_message_limit(&text);
        assert_eq!(fitted.chars().count(), DISCORD_MESSAGE_LIMIT);
        assert!(fitted.ends_with(ELLIPSIS));
    }
}
