pub mod bot;
pub mod chatbot;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod openai;
pub mod types;

pub use bot::run;
