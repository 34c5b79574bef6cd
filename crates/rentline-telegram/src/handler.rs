// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message routing and content classification.
//!
//! Determines whether an incoming Telegram message should be processed
//! based on chat type, then classifies the content into a channel-agnostic
//! [`InboundMessage`]. The bot talks to prospective renters, so there is no
//! allow-list: any private chat may start an interview.

use rentline_core::{ConversationId, InboundContent, InboundMessage, SenderProfile};
use teloxide::prelude::*;
use teloxide::types::ChatKind;
use tracing::debug;

/// Bare-text aliases that restart the interview, matched case-insensitively
/// alongside the `/start` and `/reset` commands.
const RESTART_ALIASES: &[&str] = &["start", "старт", "начать"];

/// Checks whether the message is from a private (DM) chat.
///
/// Group, supergroup, and channel messages return `false`: the bot never
/// interviews inside groups (the leads chat itself is usually a group).
pub fn is_dm(msg: &Message) -> bool {
    matches!(msg.chat.kind, ChatKind::Private(_))
}

/// Classifies trimmed message text as a restart request or a dialogue turn.
pub fn classify_text(text: &str) -> InboundContent {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if lower == "/start" || lower == "/reset" || RESTART_ALIASES.contains(&lower.as_str()) {
        return InboundContent::Restart;
    }

    InboundContent::Text(trimmed.to_string())
}

/// Classifies a Telegram message's content.
///
/// Text is classified via [`classify_text`]. Voice, audio, and video notes
/// become [`InboundContent::Unsupported`] so the agent can ask for text;
/// no transcription is attempted. Stickers, locations, and other types
/// return `None` and are ignored.
pub fn extract_content(msg: &Message) -> Option<InboundContent> {
    if let Some(text) = msg.text() {
        return Some(classify_text(text));
    }

    if msg.voice().is_some() || msg.audio().is_some() || msg.video_note().is_some() {
        return Some(InboundContent::Unsupported);
    }

    debug!(msg_id = msg.id.0, "ignoring unsupported message type");
    None
}

/// Converts a Telegram message and classified content into an
/// [`InboundMessage`].
pub fn to_inbound_message(msg: &Message, content: InboundContent) -> InboundMessage {
    let sender = match msg.from.as_ref() {
        Some(user) => SenderProfile {
            user_id: Some(user.id.0 as i64),
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
        },
        None => SenderProfile::default(),
    };

    InboundMessage {
        conversation: ConversationId(msg.chat.id.0),
        sender,
        content,
        timestamp: msg.date.to_rfc3339(),
    }
}
