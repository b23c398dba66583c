use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use common::config::Settings;
use common::logger;
use storage::DataManager;
use venue::KrakenClient;

use crate::server::{AppState, create_router};
use crate::services::orchestrator::OrderOrchestrator;
use crate::services::telegram_service::TelegramNotifier;

mod error;
mod server;
mod services;
mod traits;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    logger::setup_logger();

    let settings = Settings::from_env()?;
    info!(
        listen_addr = %settings.listen_addr,
        mode = ?settings.execution_mode,
        "Signal relay starting up..."
    );

    let data_manager = DataManager::new(&settings.database_url).await?;
    let mut orchestrator = OrderOrchestrator::new(
        settings.webhook_token.clone(),
        settings.execution_mode,
    )
    .with_store(data_manager.clone());

    if let Some(venue) = &settings.venue {
        let client = KrakenClient::from_settings(venue)?;
        info!(base_url = %venue.base_url, "Order execution enabled");
        orchestrator = orchestrator.with_venue(Arc::new(client));
    }

    if let Some(telegram) = &settings.telegram {
        let notifier = TelegramNotifier::new(&telegram.bot_token);
        orchestrator = orchestrator.with_notifier(Arc::new(notifier), telegram.chat_id);
    }

    if settings.execution_mode.is_dry_run() {
        warn!("TRADING_MODE is validate: orders are checked by the venue but never placed");
    }

    let state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator),
        store: Some(data_manager.clone()),
    });

    let listener = TcpListener::bind(&settings.listen_addr).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    data_manager.close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
