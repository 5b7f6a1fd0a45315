//! Gateway glue: turns Discord messages into chatbot input and sends the reply.

use log::{debug, info};
use poise::serenity_prelude::{Context, Message as SerenityMessage};

use crate::bot::Data;
use crate::error::Result;
use crate::history::ConversationId;

use super::mention::MessageKind;
use super::responder::Inbound;
use super::response::send_reply;

/// Main handler for new messages seen by the bot.
///
/// # Errors
///
/// Returns an error if sending the reply to Discord fails.
pub async fn handle_message(
    ctx: &Context,
    new_message: &SerenityMessage,
    data: &Data,
) -> Result<()> {
    let bot_user_id = ctx.cache.current_user().id;
    if new_message.author.id == bot_user_id || new_message.author.bot {
        return Ok(());
    }

    let kind = MessageKind::classify(
        new_message.guild_id.is_none(),
        new_message.mentions_user_id(bot_user_id),
    );
    if !kind.is_addressed() {
        return Ok(());
    }

    info!(
        "Received {:?} message from {} in channel {}: {}",
        kind,
        new_message.author.tag(),
        new_message.channel_id,
        new_message.content
    );

    if let Err(e) = new_message.channel_id.broadcast_typing(&ctx.http).await {
        debug!("Failed to broadcast typing indicator: {e}");
    }

    let inbound = Inbound {
        kind,
        conversation: ConversationId::new(new_message.author.id, new_message.channel_id),
        bot_user_id,
        content: &new_message.content,
    };

    if let Some(reply) = data.chatbot().respond(&inbound).await {
        send_reply(ctx, new_message, &reply).await?;
    }

    Ok(())
}
