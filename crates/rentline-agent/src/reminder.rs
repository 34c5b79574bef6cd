// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idle-nudge scheduling, keyed by conversation id.
//!
//! The registry is owned by the agent loop; the dialogue engine never
//! touches it. At most one pending nudge exists per conversation:
//! scheduling a new one implicitly cancels the old one, and every inbound
//! message cancels before processing. A fired nudge carries the generation
//! it was scheduled with, so a fire that lost the race with a cancel is
//! recognized as stale and discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rentline_core::ConversationId;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Emitted into the agent loop when a scheduled nudge elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderFired {
    pub conversation: ConversationId,
    pub generation: u64,
}

struct PendingNudge {
    generation: u64,
    token: CancellationToken,
}

/// Registry of pending idle nudges.
///
/// Cloning is cheap; all clones share the same state and sender.
#[derive(Clone)]
pub struct ReminderRegistry {
    pending: Arc<DashMap<i64, PendingNudge>>,
    counter: Arc<AtomicU64>,
    tx: mpsc::Sender<ReminderFired>,
}

impl ReminderRegistry {
    /// Creates a registry that reports fires through `tx`.
    pub fn new(tx: mpsc::Sender<ReminderFired>) -> Self {
        Self {
            pending: Arc::new(DashMap::new()),
            counter: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    /// Schedules a one-shot nudge for the conversation after `delay`,
    /// replacing any nudge already pending for it. Returns the generation
    /// the fire will carry.
    pub fn schedule(&self, conversation: ConversationId, delay: Duration) -> u64 {
        let generation = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        if let Some(previous) = self.pending.insert(
            conversation.0,
            PendingNudge {
                generation,
                token: token.clone(),
            },
        ) {
            previous.token.cancel();
        }

        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let _ = tx
                        .send(ReminderFired {
                            conversation,
                            generation,
                        })
                        .await;
                }
                _ = token.cancelled() => {
                    debug!(conversation = conversation.0, "nudge cancelled");
                }
            }
        });

        generation
    }

    /// Cancels the pending nudge for the conversation, if any.
    pub fn cancel(&self, conversation: ConversationId) {
        if let Some((_, nudge)) = self.pending.remove(&conversation.0) {
            nudge.token.cancel();
        }
    }

    /// Consumes the pending entry if it still matches the fired generation.
    ///
    /// Returns `false` for a stale fire: one that was cancelled or replaced
    /// after its event was already queued.
    pub fn take_if_current(&self, conversation: ConversationId, generation: u64) -> bool {
        self.pending
            .remove_if(&conversation.0, |_, nudge| nudge.generation == generation)
            .is_some()
    }

    /// Whether a nudge is pending for the conversation.
    pub fn is_pending(&self, conversation: ConversationId) -> bool {
        self.pending.contains_key(&conversation.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const CONV: ConversationId = ConversationId(1);

    #[tokio::test]
    async fn scheduled_nudge_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let registry = ReminderRegistry::new(tx);

        let generation = registry.schedule(CONV, Duration::from_millis(10));
        let fired = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("nudge should fire")
            .unwrap();

        assert_eq!(fired.conversation, CONV);
        assert_eq!(fired.generation, generation);
        assert!(registry.take_if_current(CONV, fired.generation));
    }

    #[tokio::test]
    async fn cancel_prevents_fire() {
        let (tx, mut rx) = mpsc::channel(8);
        let registry = ReminderRegistry::new(tx);

        registry.schedule(CONV, Duration::from_millis(50));
        registry.cancel(CONV);
        assert!(!registry.is_pending(CONV));

        assert!(
            timeout(Duration::from_millis(200), rx.recv()).await.is_err(),
            "cancelled nudge must not fire"
        );
    }

    #[tokio::test]
    async fn rescheduling_replaces_the_pending_nudge() {
        let (tx, mut rx) = mpsc::channel(8);
        let registry = ReminderRegistry::new(tx);

        let first = registry.schedule(CONV, Duration::from_secs(60));
        let second = registry.schedule(CONV, Duration::from_millis(10));
        assert_ne!(first, second);

        let fired = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("replacement nudge should fire")
            .unwrap();
        assert_eq!(fired.generation, second);

        // Only one entry ever existed; consuming it twice fails.
        assert!(registry.take_if_current(CONV, second));
        assert!(!registry.take_if_current(CONV, second));
    }

    #[tokio::test]
    async fn stale_fire_is_rejected() {
        let (tx, mut rx) = mpsc::channel(8);
        let registry = ReminderRegistry::new(tx);

        let generation = registry.schedule(CONV, Duration::from_millis(10));
        let fired = timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fired.generation, generation);

        // A message arrived between the fire and its processing.
        registry.cancel(CONV);
        assert!(!registry.take_if_current(CONV, generation));
    }

    #[tokio::test]
    async fn conversations_are_independent() {
        let (tx, mut rx) = mpsc::channel(8);
        let registry = ReminderRegistry::new(tx);

        registry.schedule(ConversationId(1), Duration::from_secs(60));
        registry.schedule(ConversationId(2), Duration::from_millis(10));
        registry.cancel(ConversationId(1));

        let fired = timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("second conversation's nudge should fire")
            .unwrap();
        assert_eq!(fired.conversation, ConversationId(2));
    }
}
