// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the Rentline plugin architecture.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod channel;
pub mod handoff;
pub mod store;

pub use adapter::PluginAdapter;
pub use channel::ChannelAdapter;
pub use handoff::LeadSink;
pub use store::LeadStore;
