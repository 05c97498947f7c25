use std::sync::Arc;

use dotenv::dotenv;
use teloxide::Bot;
use tokio::time::{self, Duration};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod telegram;

use booking_cell::services::{MessageHandler, PatientChatIndex, SessionRegistry};
use notification_cell::services::NotificationService;
use shared_config::AppConfig;
use telegram::TelegramTransport;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic booking bot");

    // Load configuration
    let config = AppConfig::from_env();
    if !config.is_configured() {
        error!("Missing required environment variables, refusing to start");
        std::process::exit(1);
    }

    // Shared in-memory state: sessions plus the patient-to-chat index the
    // reconciler reads.
    let registry = Arc::new(SessionRegistry::new());
    let index = Arc::new(PatientChatIndex::new());
    let handler = Arc::new(MessageHandler::new(
        &config,
        Arc::clone(&registry),
        Arc::clone(&index),
    ));

    let bot = Bot::new(config.telegram_bot_token.clone());
    let transport = Arc::new(TelegramTransport::new(bot.clone()));

    // The reconciler ticks on its own timer, independent of chat traffic.
    // A failed run is logged and retried on the next tick, never fatal.
    {
        let notifications = NotificationService::new(&config);
        let index = Arc::clone(&index);
        let transport = Arc::clone(&transport);
        let interval_secs = config.notify_interval_secs;
        tokio::spawn(async move {
            let mut ticker = time::interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                if let Err(e) = notifications.run_once(&index, transport.as_ref()).await {
                    warn!("Notification run failed, retrying next tick: {:#}", e);
                }
            }
        });
    }

    info!("Listening for Telegram updates");
    telegram::run_dispatcher(bot, handler, transport).await;
}
