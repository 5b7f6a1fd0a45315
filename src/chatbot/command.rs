//! Plain-text commands recognized in place of a prompt.

use strum::{Display, EnumString};

/// Reply sent after a conversation's history is cleared.
pub const RESET_CONFIRMATION: &str =
    "🔄 Conversation reset! I've forgotten our previous chat. Let's start fresh!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum Command {
    Reset,
    Help,
}

impl Command {
    /// Recognize a command when it makes up the whole prompt.
    ///
    /// A leading `!` is accepted for compatibility with prefix-style commands.
    #[must_use]
    pub fn parse(prompt: &str) -> Option<Self> {
        let prompt = prompt.trim();
        let token = prompt.strip_prefix('!').unwrap_or(prompt);
        token.parse().ok()
    }
}

/// Usage text shown by the `help` command.
#[must_use]
pub fn help_text(max_history_length: usize) -> String {
    format!(
        "🤖 **Conversation Bot Help**\n\
         I'm an AI-powered bot that can chat with you!\n\n\
         💬 **How to chat**\n\
         • In DMs: just send me a message\n\
         • In servers: @mention me with your message\n\n\
         📝 **Commands**\n\
         • `reset` - clear our conversation history\n\
         • `help` - show this help message\n\n\
         🧠 **Memory**\n\
         I remember up to {max_history_length} messages per conversation. \
         History is kept in memory only and is forgotten when I restart."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("reset"), Some(Command::Reset));
        assert_eq!(Command::parse("  RESET "), Some(Command::Reset));
        assert_eq!(Command::parse("Help"), Some(Command::Help));
        assert_eq!(Command::parse("!help"), Some(Command::Help));
    }

    #[test]
    fn commands_must_be_the_whole_prompt() {
        assert_eq!(Command::parse("please reset"), None);
        assert_eq!(Command::parse("help me with rust"), None);
        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("!"), None);
    }

    #[test]
    fn help_mentions_history_cap() {
        assert!(help_text(7).contains("up to 7 messages"));
    }
}
