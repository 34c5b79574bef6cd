// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Rentline lead-qualification bot.

use thiserror::Error;

/// The primary error type used across all Rentline adapter traits and core operations.
#[derive(Debug, Error)]
pub enum RentlineError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Channel adapter errors (connection failure, message format, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Lead hand-off delivery errors. Recoverable: the record stays
    /// non-terminal and the next turn retries.
    #[error("handoff error: {message}")]
    Handoff {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
