// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `rentline serve` command implementation.
//!
//! Starts the bot: SQLite lead store, Telegram channel via long polling,
//! lead-card sink into the leads chat, the agent loop, and the liveness
//! endpoint. Supports graceful shutdown via signal handlers.

use std::sync::Arc;

use rentline_agent::{shutdown, AgentLoop};
use rentline_config::RentlineConfig;
use rentline_core::{ChannelAdapter, HealthStatus, LeadStore, PluginAdapter, RentlineError};
use rentline_storage::SqliteLeadStore;
use rentline_telegram::{TelegramChannel, TelegramLeadSink};
use tracing::{error, info, warn};

use crate::health;

/// Runs the `rentline serve` command.
pub async fn run_serve(config: RentlineConfig) -> Result<(), RentlineError> {
    init_tracing(&config.agent.log_level);

    info!(agent = config.agent.name.as_str(), "starting rentline serve");

    let leads_chat_id = config.telegram.leads_chat_id.ok_or_else(|| {
        eprintln!(
            "error: telegram.leads_chat_id is required. Set it in rentline.toml or via \
             RENTLINE_TELEGRAM_LEADS_CHAT_ID (group/channel ids look like -100...)."
        );
        RentlineError::Config("telegram.leads_chat_id is required for serve".into())
    })?;

    // Initialize storage.
    let store = {
        let store = SqliteLeadStore::new(config.storage.clone());
        store.initialize().await?;
        Arc::new(store)
    };

    // Initialize the Telegram channel.
    let mut telegram = TelegramChannel::new(&config.telegram).map_err(|e| {
        error!(error = %e, "failed to initialize Telegram channel");
        eprintln!(
            "error: Telegram bot token required. Set telegram.bot_token in rentline.toml \
             or via RENTLINE_TELEGRAM_BOT_TOKEN."
        );
        e
    })?;
    telegram.connect().await?;

    report_health("telegram", &telegram).await;
    report_health("sqlite", store.as_ref()).await;

    // The sink shares the channel's bot handle but posts to the leads chat.
    let sink = Arc::new(TelegramLeadSink::new(telegram.bot().clone(), leads_chat_id));
    let channel: Arc<dyn ChannelAdapter> = Arc::new(telegram);

    // Install signal handler.
    let cancel = shutdown::install_signal_handler();

    // Spawn the liveness endpoint.
    if config.health.enabled {
        let health_config = config.health.clone();
        let health_cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = health::serve(&health_config, health_cancel).await {
                warn!(error = %e, "health endpoint failed");
            }
        });
    } else {
        info!("health endpoint disabled by configuration");
    }

    info!(
        leads_chat_id,
        reminder_minutes = config.dialogue.reminder_minutes,
        "rentline ready"
    );

    // Create and run the agent loop.
    let mut agent_loop = AgentLoop::new(channel, store, sink, config.dialogue.clone());
    agent_loop.run(cancel).await?;

    info!("rentline serve shutdown complete");
    Ok(())
}

/// Logs an adapter's startup health without failing the boot: Telegram may
/// be briefly unreachable and the loop will keep retrying anyway.
async fn report_health(name: &str, adapter: &dyn PluginAdapter) {
    match adapter.health_check().await {
        Ok(HealthStatus::Healthy) => info!(adapter = name, "health check passed"),
        Ok(HealthStatus::Degraded(reason)) => {
            warn!(adapter = name, reason = reason.as_str(), "adapter degraded")
        }
        Ok(HealthStatus::Unhealthy(reason)) => {
            warn!(adapter = name, reason = reason.as_str(), "adapter unhealthy")
        }
        Err(e) => warn!(adapter = name, error = %e, "health check failed"),
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rentline={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
