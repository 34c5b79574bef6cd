// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hand-off sink trait for delivering completed leads to a human operator.

use async_trait::async_trait;

use crate::error::RentlineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::Lead;

/// Delivers a fully-qualified lead to a human operator.
///
/// The dialogue engine only *decides* when a hand-off should happen; the
/// agent loop invokes the sink and maps the outcome back onto the record.
/// No retries happen inside the sink; retry-on-next-turn is the only
/// retry policy.
#[async_trait]
pub trait LeadSink: PluginAdapter {
    /// Delivers the lead. `Err` leaves the record non-terminal so the next
    /// turn can retry.
    async fn deliver(&self, lead: &Lead) -> Result<(), RentlineError>;
}
