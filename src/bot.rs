//! Discord bot core logic and event handling.

use log::{debug, info};
use poise::{
    Framework, FrameworkOptions, builtins,
    serenity_prelude::{ClientBuilder, Context, FullEvent, GatewayIntents},
};

use crate::chatbot::{Chatbot, handle_message};
use crate::commands::conversation_commands;
use crate::config::Config;
use crate::error::Result;
use crate::history::HistoryStore;
use crate::openai::OpenAiClient;

/// Shared state handed to every event and command.
pub struct Data {
    chatbot: Chatbot<OpenAiClient>,
}

impl Data {
    #[must_use]
    pub fn chatbot(&self) -> &Chatbot<OpenAiClient> {
        &self.chatbot
    }
}

/// Run the Discord bot.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the Discord client fails
/// to connect, including when Discord rejects the bot token.
pub async fn run() -> Result<()> {
    info!("Initializing bot");
    let config = Config::from_env()?;

    debug!("Initializing completion client");
    let completion_client = OpenAiClient::from_config(&config)?;
    info!("Using completion model {}", completion_client.model());

    let store = HistoryStore::new(config.max_history_length);
    let chatbot = Chatbot::new(store, completion_client);

    debug!("Setting up gateway intents");
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::DIRECT_MESSAGES;

    debug!("Building framework");
    let framework = Framework::builder()
        .options(FrameworkOptions {
            commands: conversation_commands(),
            event_handler: |ctx, event, _framework, data| Box::pin(event_handler(ctx, event, data)),
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!(
                    "Bot is ready and connected to Discord as {} (ID: {})",
                    ready.user.name, ready.user.id
                );
                debug!("Registering commands globally");
                builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Commands registered successfully");
                Ok(Data { chatbot })
            })
        })
        .build();

    debug!("Creating Discord client");
    let mut client = ClientBuilder::new(config.discord_token, intents)
        .framework(framework)
        .await?;

    info!("Starting Discord client");

    tokio::select! {
        result = client.start() => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, shutting down...");
        }
    }

    Ok(())
}

async fn event_handler(ctx: &Context, event: &FullEvent, data: &Data) -> Result<()> {
    if let FullEvent::Message { new_message } = event {
        handle_message(ctx, new_message, data).await?;
    }
    Ok(())
}
