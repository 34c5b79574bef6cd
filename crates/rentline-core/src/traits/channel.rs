// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for the messaging platform integration.

use async_trait::async_trait;

use crate::error::RentlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCapabilities, ConversationId, InboundMessage, OutboundMessage};

/// Adapter for a bidirectional messaging channel.
///
/// Channel adapters connect Rentline to an external messaging platform,
/// handling message ingestion and delivery. `connect` is called once before
/// the agent loop starts; `receive` is then polled from the loop.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Returns the capabilities supported by this channel.
    fn capabilities(&self) -> ChannelCapabilities;

    /// Establishes a connection to the messaging platform.
    async fn connect(&mut self) -> Result<(), RentlineError>;

    /// Sends a message through the channel.
    async fn send(&self, msg: OutboundMessage) -> Result<(), RentlineError>;

    /// Receives the next inbound message from the channel.
    async fn receive(&self) -> Result<InboundMessage, RentlineError>;

    /// Shows a typing indicator in the given conversation, if supported.
    async fn send_typing(&self, conversation: ConversationId) -> Result<(), RentlineError>;
}
