// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Rentline bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Rentline configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values; `telegram.bot_token` and `telegram.leads_chat_id` are only
/// required when the bot is actually started.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RentlineConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Telegram bot integration settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Interview pacing: reminders and humanized reply delays.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Liveness endpoint settings.
    #[serde(default)]
    pub health: HealthConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the agent.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "rentline".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram bot integration configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram Bot API token. Required to start the bot.
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Chat that receives completed lead cards (group/channel ids are
    /// negative `-100…` values; a private chat id also works if that user
    /// has started the bot). Required to start the bot.
    #[serde(default)]
    pub leads_chat_id: Option<i64>,
}

/// Interview pacing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DialogueConfig {
    /// Minutes of silence before the pending question is restated.
    /// 0 disables reminders.
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: u64,

    /// Lower bound of the random pause before each reply, in seconds.
    #[serde(default = "default_reply_delay_min")]
    pub reply_delay_min_secs: u64,

    /// Upper bound of the random pause before each reply, in seconds.
    #[serde(default = "default_reply_delay_max")]
    pub reply_delay_max_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            reminder_minutes: default_reminder_minutes(),
            reply_delay_min_secs: default_reply_delay_min(),
            reply_delay_max_secs: default_reply_delay_max(),
        }
    }
}

fn default_reminder_minutes() -> u64 {
    15
}

fn default_reply_delay_min() -> u64 {
    10
}

fn default_reply_delay_max() -> u64 {
    15
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    "data/rentline.db".to_string()
}

fn default_wal_mode() -> bool {
    true
}

/// Liveness endpoint configuration. Hosting platforms probe this to keep
/// the process alive.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HealthConfig {
    /// Whether to serve the HTTP liveness endpoint.
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,

    /// Host address to bind.
    #[serde(default = "default_health_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            host: default_health_host(),
            port: default_health_port(),
        }
    }
}

fn default_health_enabled() -> bool {
    true
}

fn default_health_host() -> String {
    "0.0.0.0".to_string()
}

fn default_health_port() -> u16 {
    10000
}
