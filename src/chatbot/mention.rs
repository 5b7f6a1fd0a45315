//! Deciding whether a message is addressed to the bot.

use poise::serenity_prelude::UserId;

/// How an inbound message reached the bot. Decided once per event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Direct message; always answered.
    Direct,
    /// Shared channel message that mentions the bot.
    Mention,
    /// Shared channel message not addressed to the bot.
    Unaddressed,
}

impl MessageKind {
    #[must_use]
    pub fn classify(is_direct: bool, mentions_bot: bool) -> Self {
        match (is_direct, mentions_bot) {
            (true, _) => MessageKind::Direct,
            (false, true) => MessageKind::Mention,
            (false, false) => MessageKind::Unaddressed,
        }
    }

    #[must_use]
    pub fn is_addressed(self) -> bool {
        self != MessageKind::Unaddressed
    }
}

/// Punctuation that attaches to the preceding word once a mention is removed.
const CLOSING_PUNCTUATION: [char; 6] = [',', '.', '!', '?', ';', ':'];

/// Remove every mention of the bot (`<@id>` and the legacy `<@!id>`).
///
/// The text around each mention is rejoined with a single space, or with no
/// space before closing punctuation, and the result is trimmed.
#[must_use]
pub fn strip_mention(content: &str, bot_user_id: UserId) -> String {
    let mention = format!("<@{bot_user_id}>");
    let content = content.replace(&format!("<@!{bot_user_id}>"), &mention);

    let mut prompt = String::new();
    for piece in content.split(mention.as_str()) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        if !prompt.is_empty() && !piece.starts_with(CLOSING_PUNCTUATION) {
            prompt.push(' ');
        }
        prompt.push_str(piece);
    }
    prompt
}
