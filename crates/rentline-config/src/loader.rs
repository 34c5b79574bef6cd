// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./rentline.toml` > `~/.config/rentline/rentline.toml`
//! > `/etc/rentline/rentline.toml` with environment variable overrides via
//! the `RENTLINE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::RentlineConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/rentline/rentline.toml` (system-wide)
/// 3. `~/.config/rentline/rentline.toml` (user XDG config)
/// 4. `./rentline.toml` (local directory)
/// 5. `RENTLINE_*` environment variables
pub fn load_config() -> Result<RentlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RentlineConfig::default()))
        .merge(Toml::file("/etc/rentline/rentline.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("rentline/rentline.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("rentline.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<RentlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RentlineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RentlineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RentlineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RENTLINE_TELEGRAM_BOT_TOKEN` must map
/// to `telegram.bot_token`, not `telegram.bot.token`.
fn env_provider() -> Env {
    Env::prefixed("RENTLINE_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped,
        // e.g. RENTLINE_TELEGRAM_BOT_TOKEN -> "telegram_bot_token".
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("dialogue_", "dialogue.", 1)
            .replacen("storage_", "storage.", 1)
            .replacen("health_", "health.", 1);
        mapped.into()
    })
}
