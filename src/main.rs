#[tokio::main]
async fn main() -> convobot::error::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("convobot=info,serenity=warn"),
    )
    .init();
    log::info!("Starting convobot Discord bot");

    match convobot::run().await {
        Ok(()) => {
            log::info!("Bot shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Bot encountered an error: {e}");
            Err(e)
        }
    }
}
