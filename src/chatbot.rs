//! AI chatbot module - handles direct messages, bot mentions and conversations.

mod command;
mod handler;
mod mention;
mod responder;
mod response;

pub use command::{Command, RESET_CONFIRMATION, help_text};
pub use handler::handle_message;
pub use mention::{MessageKind, strip_mention};
pub use responder::{Chatbot, Completer, Inbound};
