//! AzBuddy bot
//!
//! Main application entry point

use std::sync::Arc;
use teloxide::Bot;
use tracing::info;

use azbuddy::{
    config::{ChannelMode, Settings, StorageBackend},
    dialogs::{FlowOptions, FlowRegistry, StepEngine, StepServices},
    handlers::{run_console, run_telegram, RootController},
    services::{ArmClient, ResourceProvider},
    state::{DialogStateStore, MemoryStateStore, RedisStateStore},
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", azbuddy::info());

    let provider: Arc<dyn ResourceProvider> = Arc::new(ArmClient::new(&settings.azure)?);

    let store: Arc<dyn DialogStateStore> = match settings.storage.backend {
        StorageBackend::Redis => {
            info!("Connecting to Redis...");
            let store = RedisStateStore::new(settings.redis.clone()).await?;
            store.test_connection().await?;
            Arc::new(store)
        }
        StorageBackend::Memory => {
            info!("Keeping dialog state in memory");
            Arc::new(MemoryStateStore::new())
        }
    };

    let registry = Arc::new(FlowRegistry::azure());
    let services = Arc::new(StepServices::new(provider, FlowOptions::from(&settings.azure)));
    let engine = StepEngine::new(registry, services);
    let controller = Arc::new(RootController::new(engine, store, &settings.bot.welcome_message));

    match settings.bot.mode {
        ChannelMode::Telegram => {
            info!("Starting bot with polling mode...");
            run_telegram(Bot::new(&settings.bot.token), controller).await?;
        }
        ChannelMode::Console => {
            run_console(controller).await?;
        }
    }

    info!("AzBuddy has been shut down.");

    Ok(())
}
