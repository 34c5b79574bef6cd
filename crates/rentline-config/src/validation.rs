// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as delay ordering and non-empty paths.

use crate::diagnostic::ConfigError;
use crate::model::RentlineConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &RentlineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "storage.database_path must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "agent.log_level `{}` is not one of: {}",
                config.agent.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.dialogue.reply_delay_min_secs > config.dialogue.reply_delay_max_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "dialogue.reply_delay_min_secs ({}) must not exceed reply_delay_max_secs ({})",
                config.dialogue.reply_delay_min_secs, config.dialogue.reply_delay_max_secs
            ),
        });
    }

    if config.health.enabled {
        let host = config.health.host.trim();
        if host.is_empty() {
            errors.push(ConfigError::Validation {
                message: "health.host must not be empty".to_string(),
            });
        } else {
            let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
            let is_valid_hostname = host
                .chars()
                .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
            if !is_valid_ip && !is_valid_hostname {
                errors.push(ConfigError::Validation {
                    message: format!("health.host `{host}` is not a valid IP address or hostname"),
                });
            }
        }
    }

    if let Some(0) = config.telegram.leads_chat_id {
        errors.push(ConfigError::Validation {
            message: "telegram.leads_chat_id must be a real chat id, not 0".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
