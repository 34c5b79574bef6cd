// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telegram channel adapter for the Rentline bot.
//!
//! Implements [`ChannelAdapter`] for the Telegram Bot API via teloxide,
//! providing long polling, DM filtering, content classification, and lead
//! card delivery to the operators' chat.

pub mod card;
pub mod handler;
pub mod sink;

use async_trait::async_trait;
use rentline_config::model::TelegramConfig;
use rentline_core::{
    AdapterType, ChannelAdapter, ConversationId, HealthStatus, InboundMessage, OutboundMessage,
    PluginAdapter, RentlineError,
};
use rentline_core::types::ChannelCapabilities;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, ChatId, ParseMode, Recipient};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub use sink::TelegramLeadSink;

/// Telegram channel adapter implementing [`ChannelAdapter`].
///
/// Connects to Telegram via long polling, filters messages down to private
/// chats, and classifies content into channel-agnostic inbound messages.
pub struct TelegramChannel {
    bot: Bot,
    inbound_rx: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
    inbound_tx: mpsc::Sender<InboundMessage>,
    polling_handle: Option<tokio::task::JoinHandle<()>>,
}

impl TelegramChannel {
    /// Creates a new Telegram channel adapter.
    ///
    /// Requires `config.bot_token` to be set.
    pub fn new(config: &TelegramConfig) -> Result<Self, RentlineError> {
        let token = config.bot_token.as_deref().ok_or_else(|| {
            RentlineError::Config("telegram.bot_token is required for the Telegram channel".into())
        })?;

        if token.is_empty() {
            return Err(RentlineError::Config(
                "telegram.bot_token cannot be empty".into(),
            ));
        }

        let bot = Bot::new(token);
        let (inbound_tx, inbound_rx) = mpsc::channel(100);

        Ok(Self {
            bot,
            inbound_rx: tokio::sync::Mutex::new(inbound_rx),
            inbound_tx,
            polling_handle: None,
        })
    }

    /// Returns a reference to the underlying teloxide Bot.
    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

#[async_trait]
impl PluginAdapter for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
        // Check that the bot token is valid by calling getMe.
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RentlineError> {
        debug!("Telegram channel shutting down");
        // The polling handle is dropped with the channel, which aborts the
        // task. For graceful shutdown the agent loop stops calling
        // receive() first.
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for TelegramChannel {
    fn capabilities(&self) -> ChannelCapabilities {
        ChannelCapabilities {
            supports_typing: true,
            max_message_length: Some(4096),
        }
    }

    async fn connect(&mut self) -> Result<(), RentlineError> {
        if self.polling_handle.is_some() {
            return Ok(()); // Already connected
        }

        let bot = self.bot.clone();
        let tx = self.inbound_tx.clone();

        // Drop any stale webhook so long polling definitely receives updates.
        if let Err(e) = self.bot.delete_webhook().drop_pending_updates(true).await {
            warn!(error = %e, "failed to delete webhook before polling");
        }

        info!("starting Telegram long polling");

        let handle = tokio::spawn(async move {
            let endpoint = move |msg: Message| {
                let tx = tx.clone();
                async move {
                    if !handler::is_dm(&msg) {
                        debug!(chat_id = msg.chat.id.0, "ignoring non-DM message");
                        return respond(());
                    }

                    match handler::extract_content(&msg) {
                        Some(content) => {
                            let inbound = handler::to_inbound_message(&msg, content);
                            if tx.send(inbound).await.is_err() {
                                warn!("inbound channel closed, dropping message");
                            }
                        }
                        None => {
                            debug!(msg_id = msg.id.0, "ignoring unsupported message type");
                        }
                    }

                    respond(())
                }
            };

            Dispatcher::builder(bot, Update::filter_message().endpoint(endpoint))
                .default_handler(|_| async {}) // Silently ignore non-message updates
                .build()
                .dispatch()
                .await;
        });

        self.polling_handle = Some(handle);
        Ok(())
    }

    async fn send(&self, msg: OutboundMessage) -> Result<(), RentlineError> {
        let chat_id = ChatId(msg.conversation.0);

        let request = self.bot.send_message(Recipient::Id(chat_id), &msg.text);
        let request = if msg.html {
            request.parse_mode(ParseMode::Html)
        } else {
            request
        };

        request.await.map_err(|e| {
            error!(chat_id = chat_id.0, error = %e, "failed to send message");
            RentlineError::Channel {
                message: format!("failed to send message: {e}"),
                source: Some(Box::new(e)),
            }
        })?;

        Ok(())
    }

    async fn receive(&self) -> Result<InboundMessage, RentlineError> {
        let mut rx = self.inbound_rx.lock().await;
        rx.recv().await.ok_or_else(|| RentlineError::Channel {
            message: "Telegram inbound channel closed".into(),
            source: None,
        })
    }

    async fn send_typing(&self, conversation: ConversationId) -> Result<(), RentlineError> {
        self.bot
            .send_chat_action(ChatId(conversation.0), ChatAction::Typing)
            .await
            .map_err(|e| RentlineError::Channel {
                message: format!("failed to send typing indicator: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_config(token: Option<&str>) -> TelegramConfig {
        TelegramConfig {
            bot_token: token.map(String::from),
            leads_chat_id: Some(-1001234567890),
        }
    }

    #[test]
    fn new_requires_bot_token() {
        assert!(TelegramChannel::new(&make_config(None)).is_err());
    }

    #[test]
    fn new_rejects_empty_token() {
        assert!(TelegramChannel::new(&make_config(Some(""))).is_err());
    }

    #[test]
    fn new_accepts_valid_token() {
        let channel =
            TelegramChannel::new(&make_config(Some("123456:ABC-DEF1234ghIkl-zyx57W2v1u123ew11")));
        assert!(channel.is_ok());
    }

    #[test]
    fn capabilities_are_correct() {
        let channel = TelegramChannel::new(&make_config(Some("123:test"))).unwrap();
        let caps = channel.capabilities();
        assert!(caps.supports_typing);
        assert_eq!(caps.max_message_length, Some(4096));
    }

    #[test]
    fn plugin_adapter_metadata() {
        let channel = TelegramChannel::new(&make_config(Some("123:test"))).unwrap();
        assert_eq!(channel.name(), "telegram");
        assert_eq!(channel.version(), semver::Version::new(0, 1, 0));
        assert_eq!(channel.adapter_type(), AdapterType::Channel);
    }
}
