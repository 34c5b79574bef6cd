// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Rentline bot.
//!
//! The central type is [`Lead`], the per-conversation record of the
//! qualification interview. All interview state is derived from which of
//! its tracked fields are populated; there is no separate state enum.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifies one end-user conversation. For Telegram this is the chat id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub i64);

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
    Handoff,
}

/// Capabilities reported by a channel adapter.
#[derive(Debug, Clone)]
pub struct ChannelCapabilities {
    /// Whether the channel can show a "typing…" indicator.
    pub supports_typing: bool,
    /// Maximum outbound message length, if the platform enforces one.
    pub max_message_length: Option<usize>,
}

/// Who sent an inbound message. Display-only: none of these fields feed
/// the dialogue state machine, they only decorate the lead card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SenderProfile {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

/// Classified content of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    /// Free-form text, trimmed.
    Text(String),
    /// An explicit restart request (`/start`, `/reset` or a bare-text alias).
    Restart,
    /// Voice, audio, stickers and other content the interview cannot read.
    Unsupported,
}

/// An inbound message received from a channel adapter.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub conversation: ConversationId,
    pub sender: SenderProfile,
    pub content: InboundContent,
    /// RFC 3339 receive timestamp, as reported by the platform.
    pub timestamp: String,
}

/// An outbound message to be sent via a channel adapter.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub conversation: ConversationId,
    pub text: String,
    /// Render as Telegram HTML (lead cards) instead of plain text.
    pub html: bool,
}

impl OutboundMessage {
    /// A plain-text dialogue reply.
    pub fn text(conversation: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation,
            text: text.into(),
            html: false,
        }
    }
}

/// Snapshot of the five tracked interview fields, used to detect whether a
/// turn made progress. Presence and value both matter: a turn that changes
/// any of these resets the stuck counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSnapshot {
    pub people_count: Option<u32>,
    pub move_in: Option<String>,
    pub employment: Option<String>,
    pub showing_time: Option<String>,
    pub showing_text: Option<String>,
}

/// The per-conversation lead record.
///
/// Every field carries `#[serde(default)]` so that truncated or outdated
/// persisted blobs deserialize by defaulting what is missing; unknown keys
/// are dropped by serde. Tracked fields are write-once: the engine never
/// overwrites a populated field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub conversation_id: i64,

    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,

    #[serde(default)]
    pub people_count: Option<u32>,
    #[serde(default)]
    pub move_in: Option<String>,
    #[serde(default)]
    pub employment: Option<String>,

    /// Normalized showing slot (day bucket + optional clock time).
    #[serde(default)]
    pub showing_time: Option<String>,
    /// The raw showing answer, kept alongside the parsed form.
    #[serde(default)]
    pub showing_text: Option<String>,

    #[serde(default)]
    pub handoff_sent: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub last_question: Option<String>,

    #[serde(default)]
    pub stuck_count: u32,

    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Lead {
    /// Creates an empty record for a previously unseen conversation.
    pub fn new(conversation: ConversationId, sender: &SenderProfile) -> Self {
        Self {
            conversation_id: conversation.0,
            user_id: sender.user_id,
            username: sender.username.clone(),
            first_name: sender.first_name.clone(),
            people_count: None,
            move_in: None,
            employment: None,
            showing_time: None,
            showing_text: None,
            handoff_sent: false,
            paused: false,
            last_question: None,
            stuck_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    /// The conversation this record belongs to.
    pub fn conversation(&self) -> ConversationId {
        ConversationId(self.conversation_id)
    }

    pub fn has_people_count(&self) -> bool {
        self.people_count.is_some()
    }

    pub fn has_move_in(&self) -> bool {
        self.move_in.as_deref().is_some_and(|v| !v.is_empty())
    }

    pub fn has_employment(&self) -> bool {
        self.employment.as_deref().is_some_and(|v| !v.is_empty())
    }

    pub fn has_showing_time(&self) -> bool {
        self.showing_time.as_deref().is_some_and(|v| !v.is_empty())
    }

    pub fn has_showing_text(&self) -> bool {
        self.showing_text.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Whether the interview has ended and the lead was delivered.
    pub fn is_terminal(&self) -> bool {
        self.handoff_sent || self.paused
    }

    /// Captures the five tracked fields for progress comparison.
    pub fn snapshot(&self) -> FieldSnapshot {
        FieldSnapshot {
            people_count: self.people_count,
            move_in: self.move_in.clone(),
            employment: self.employment.clone(),
            showing_time: self.showing_time.clone(),
            showing_text: self.showing_text.clone(),
        }
    }

    /// Stamps `updated_at` (and `created_at` on first persistence).
    pub fn touch(&mut self) {
        let now = chrono::Utc::now().to_rfc3339();
        if self.created_at.is_empty() {
            self.created_at = now.clone();
        }
        self.updated_at = now;
    }
}
