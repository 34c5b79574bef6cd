// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage trait for lead record persistence.

use async_trait::async_trait;

use crate::error::RentlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationId, Lead};

/// Adapter for the lead persistence backend.
///
/// Reads and writes are whole-record: one opaque blob per conversation,
/// keyed by conversation id. Absence of a record is the valid
/// "new conversation" signal, not an error.
#[async_trait]
pub trait LeadStore: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), RentlineError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), RentlineError>;

    /// Loads the record for a conversation, if one exists.
    async fn load(&self, conversation: ConversationId) -> Result<Option<Lead>, RentlineError>;

    /// Upserts the whole record, stamping its timestamps.
    async fn save(&self, lead: &Lead) -> Result<(), RentlineError>;

    /// Discards the record entirely. A fresh one is created lazily on the
    /// conversation's next message.
    async fn delete(&self, conversation: ConversationId) -> Result<(), RentlineError>;
}
