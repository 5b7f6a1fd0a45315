//! Poise slash commands mirroring the plain-text `reset` and `help` commands.

use crate::bot::Data;
use crate::error::{BotError, Result};
use crate::history::ConversationId;

/// Context type for slash commands.
type Context<'a> = poise::Context<'a, Data, BotError>;

/// Forget our conversation in this channel.
#[poise::command(slash_command)]
pub async fn reset(ctx: Context<'_>) -> Result<()> {
    let conversation = ConversationId::new(ctx.author().id, ctx.channel_id());
    let confirmation = ctx.data().chatbot().reset(&conversation).await;

    ctx.say(confirmation).await?;
    Ok(())
}

/// Show how to chat with the bot.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<()> {
    ctx.say(ctx.data().chatbot().help_text()).await?;
    Ok(())
}

/// Get available conversation commands.
#[must_use]
pub fn conversation_commands() -> Vec<poise::Command<Data, BotError>> {
    vec![reset(), help()]
}
