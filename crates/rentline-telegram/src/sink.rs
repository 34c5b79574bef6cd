// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lead delivery to the operators' Telegram chat.

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode, Recipient};
use tracing::{debug, warn};

use rentline_core::{
    AdapterType, HealthStatus, Lead, LeadSink, PluginAdapter, RentlineError,
};

use crate::card;

/// Posts completed lead cards to the configured leads chat.
///
/// Delivery is single-shot: an error is reported back to the agent loop,
/// which leaves the record non-terminal so the next turn retries.
pub struct TelegramLeadSink {
    bot: Bot,
    leads_chat_id: ChatId,
}

impl TelegramLeadSink {
    /// Creates a sink posting to `leads_chat_id` (group/channel ids are
    /// negative `-100…` values).
    pub fn new(bot: Bot, leads_chat_id: i64) -> Self {
        Self {
            bot,
            leads_chat_id: ChatId(leads_chat_id),
        }
    }
}

#[async_trait]
impl PluginAdapter for TelegramLeadSink {
    fn name(&self) -> &str {
        "telegram-leads"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Handoff
    }

    async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
        match self.bot.get_me().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "Telegram bot unreachable: {e}"
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), RentlineError> {
        Ok(())
    }
}

#[async_trait]
impl LeadSink for TelegramLeadSink {
    async fn deliver(&self, lead: &Lead) -> Result<(), RentlineError> {
        let text = card::lead_card(lead);

        match self
            .bot
            .send_message(Recipient::Id(self.leads_chat_id), &text)
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => {
                debug!(
                    conversation = lead.conversation_id,
                    "lead card delivered to leads chat"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    conversation = lead.conversation_id,
                    error = %e,
                    "failed to deliver lead card"
                );
                Err(RentlineError::Handoff {
                    message: format!("failed to deliver lead card: {e}"),
                    source: Some(Box::new(e)),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_plugin_metadata() {
        let sink = TelegramLeadSink::new(Bot::new("123:test-token"), -1001234567890);
        assert_eq!(sink.name(), "telegram-leads");
        assert_eq!(sink.adapter_type(), AdapterType::Handoff);
        assert_eq!(sink.version(), semver::Version::new(0, 1, 0));
    }
}
