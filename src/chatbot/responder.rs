//! Platform-independent message handling: commands, history and completions.

use log::{debug, error, info};
use poise::serenity_prelude::UserId;

use crate::error::CompletionError;
use crate::history::{ConversationId, HistoryStore};
use crate::types::{MessageRole, Turn};

use super::command::{Command, RESET_CONFIRMATION, help_text};
use super::mention::{MessageKind, strip_mention};

/// Produces an assistant reply from a conversation's turns.
pub trait Completer {
    fn complete(
        &self,
        history: &[Turn],
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

/// An inbound chat message, already classified.
#[derive(Debug, Clone)]
pub struct Inbound<'a> {
    pub kind: MessageKind,
    pub conversation: ConversationId,
    pub bot_user_id: UserId,
    pub content: &'a str,
}

pub struct Chatbot<C> {
    store: HistoryStore,
    completer: C,
}

impl<C: Completer> Chatbot<C> {
    #[must_use]
    pub fn new(store: HistoryStore, completer: C) -> Self {
        Self { store, completer }
    }

    #[must_use]
    pub fn help_text(&self) -> String {
        help_text(self.store.cap())
    }

    /// Clear a conversation's history and return the confirmation reply.
    pub async fn reset(&self, conversation: &ConversationId) -> &'static str {
        self.store.clear(conversation).await;
        info!("Reset conversation {conversation}");
        RESET_CONFIRMATION
    }

    /// Handle one inbound message.
    ///
    /// Returns the single reply to send, or `None` when the message is not
    /// addressed to the bot. Completion failures become an apologetic reply.
    pub async fn respond(&self, inbound: &Inbound<'_>) -> Option<String> {
        if !inbound.kind.is_addressed() {
            return None;
        }

        let prompt = strip_mention(inbound.content, inbound.bot_user_id);
        if prompt.is_empty() {
            debug!("Empty prompt in {}, sending help", inbound.conversation);
            return Some(self.help_text());
        }

        match Command::parse(&prompt) {
            Some(Command::Reset) => {
                let confirmation = self.reset(&inbound.conversation).await;
                return Some(confirmation.to_string());
            }
            Some(Command::Help) => return Some(self.help_text()),
            None => {}
        }

        let mut conversation = self.store.lock(&inbound.conversation).await;
        conversation.append(MessageRole::User, prompt);
        debug!(
            "Conversation {} has {} turns",
            inbound.conversation,
            conversation.turns().len()
        );

        match self.completer.complete(conversation.turns()).await {
            Ok(reply) => {
                conversation.append(MessageRole::Assistant, reply.as_str());
                Some(reply)
            }
            Err(e) => {
                error!(
                    "Completion failed for conversation {}: {e}",
                    inbound.conversation
                );
                Some(e.user_message().to_string())
            }
        }
    }
}
