// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Rentline lead-qualification bot.
//!
//! This crate provides the foundational trait definitions, error types, and
//! the [`Lead`] record shared across the Rentline workspace. All adapter
//! implementations (Telegram channel, SQLite store, lead sink) implement
//! traits defined here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::RentlineError;
pub use types::{
    AdapterType, ConversationId, FieldSnapshot, HealthStatus, InboundContent, InboundMessage,
    Lead, OutboundMessage, SenderProfile,
};

// Re-export all adapter traits at crate root.
pub use traits::{ChannelAdapter, LeadSink, LeadStore, PluginAdapter};
