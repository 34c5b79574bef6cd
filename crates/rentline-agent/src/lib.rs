// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent loop for the Rentline bot.
//!
//! The [`AgentLoop`] is the central coordinator that:
//! - Receives classified messages from the channel adapter
//! - Serializes turns per conversation while letting different
//!   conversations proceed concurrently
//! - Runs each turn through the dialogue engine
//! - Performs the hand-off when the engine signals one, mapping the
//!   outcome back onto the record
//! - Owns the idle-nudge registry and restates the pending question after
//!   configured silence
//! - Handles graceful shutdown
//!
//! Every mutation of a lead record happens under that conversation's lock,
//! against a record freshly loaded from the store, so two near-simultaneous
//! messages can never interleave a read-modify-write.

pub mod reminder;
pub mod shutdown;

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use rand::Rng;
use rentline_config::model::DialogueConfig;
use rentline_core::{
    ChannelAdapter, ConversationId, InboundContent, InboundMessage, Lead, LeadSink, LeadStore,
    OutboundMessage, RentlineError, SenderProfile,
};
use rentline_engine::{decide_reply, prompts};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::reminder::{ReminderFired, ReminderRegistry};

/// The main agent loop coordinating channel, engine, store, and sink.
pub struct AgentLoop {
    ctx: TurnContext,
    reminder_rx: mpsc::Receiver<ReminderFired>,
}

/// Everything a single turn needs, cheaply cloneable into spawned tasks.
#[derive(Clone)]
struct TurnContext {
    channel: Arc<dyn ChannelAdapter>,
    store: Arc<dyn LeadStore>,
    sink: Arc<dyn LeadSink>,
    dialogue: DialogueConfig,
    reminders: ReminderRegistry,
    locks: Arc<DashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl AgentLoop {
    /// Creates a new agent loop over connected adapters.
    pub fn new(
        channel: Arc<dyn ChannelAdapter>,
        store: Arc<dyn LeadStore>,
        sink: Arc<dyn LeadSink>,
        dialogue: DialogueConfig,
    ) -> Self {
        let (reminder_tx, reminder_rx) = mpsc::channel(100);
        info!("agent loop initialized");

        Self {
            ctx: TurnContext {
                channel,
                store,
                sink,
                dialogue,
                reminders: ReminderRegistry::new(reminder_tx),
                locks: Arc::new(DashMap::new()),
            },
            reminder_rx,
        }
    }

    /// Runs the main agent loop until the cancellation token is triggered.
    ///
    /// Each inbound message and each fired nudge is processed in its own
    /// task under the owning conversation's lock. On cancellation the
    /// storage backend is closed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), RentlineError> {
        info!("agent loop running");

        loop {
            tokio::select! {
                msg = self.ctx.channel.receive() => {
                    match msg {
                        Ok(inbound) => {
                            let ctx = self.ctx.clone();
                            tokio::spawn(async move {
                                ctx.process_inbound(inbound).await;
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "channel receive error");
                            // If the channel is closed, break out of the loop.
                            if e.to_string().contains("closed") {
                                break;
                            }
                        }
                    }
                }
                Some(fired) = self.reminder_rx.recv() => {
                    let ctx = self.ctx.clone();
                    tokio::spawn(async move {
                        ctx.process_reminder(fired).await;
                    });
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        self.ctx.store.close().await?;
        info!("agent loop stopped");
        Ok(())
    }
}

impl TurnContext {
    fn conversation_lock(&self, conversation: ConversationId) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .entry(conversation.0)
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Processes one inbound message under the conversation's lock.
    async fn process_inbound(&self, inbound: InboundMessage) {
        let conversation = inbound.conversation;

        // A new message always cancels the pending nudge before the turn
        // is processed.
        self.reminders.cancel(conversation);

        let lock = self.conversation_lock(conversation);
        let _guard = lock.lock().await;

        if let Err(e) = self.handle_turn(inbound).await {
            error!(
                conversation = conversation.0,
                error = %e,
                "failed to handle inbound message"
            );
        }
    }

    async fn handle_turn(&self, inbound: InboundMessage) -> Result<(), RentlineError> {
        let conversation = inbound.conversation;

        match inbound.content {
            InboundContent::Restart => {
                self.store.delete(conversation).await?;
                debug!(conversation = conversation.0, "interview restarted");
                self.humanized_delay(conversation).await;
                self.channel
                    .send(OutboundMessage::text(conversation, prompts::Q1))
                    .await
            }
            InboundContent::Unsupported => {
                // No transcription: ask for text without touching the record.
                self.channel
                    .send(OutboundMessage::text(conversation, prompts::ASK_FOR_TEXT))
                    .await
            }
            InboundContent::Text(text) => {
                self.handle_text_turn(conversation, &inbound.sender, &text).await
            }
        }
    }

    async fn handle_text_turn(
        &self,
        conversation: ConversationId,
        sender: &SenderProfile,
        text: &str,
    ) -> Result<(), RentlineError> {
        let mut lead = match self.store.load(conversation).await? {
            Some(lead) => lead,
            None => Lead::new(conversation, sender),
        };

        // After a successful hand-off the interview only ever repeats the
        // closing message.
        if lead.is_terminal() {
            return self
                .channel
                .send(OutboundMessage::text(conversation, prompts::CLOSING))
                .await;
        }

        // Auto-start: the first message opens the interview but is not
        // treated as an answer, which keeps the opener from swallowing a
        // greeting as data.
        let started = lead
            .last_question
            .as_deref()
            .is_some_and(|q| !q.is_empty());
        if !started {
            lead.last_question = Some(prompts::Q1.to_string());
            self.store.save(&lead).await?;
            self.humanized_delay(conversation).await;
            self.channel
                .send(OutboundMessage::text(conversation, prompts::Q1))
                .await?;
            self.maybe_schedule_reminder(conversation);
            return Ok(());
        }

        let decision = decide_reply(&mut lead, text);
        let mut reply = decision.reply.clone();

        if decision.handoff && !lead.handoff_sent {
            match self.sink.deliver(&lead).await {
                Ok(()) => {
                    lead.handoff_sent = true;
                    lead.paused = true;
                    info!(conversation = conversation.0, "lead handed off");
                }
                Err(e) => {
                    // Recoverable: the record stays non-terminal and the
                    // next turn signals the hand-off again.
                    warn!(
                        conversation = conversation.0,
                        error = %e,
                        "hand-off delivery failed, will retry next turn"
                    );
                    lead.handoff_sent = false;
                    lead.paused = false;
                    reply = format!(
                        "{}{}",
                        prompts::HANDOFF_FAILED_NOTICE,
                        decision.next_question.as_deref().unwrap_or(prompts::Q1)
                    );
                }
            }
        }

        self.store.save(&lead).await?;
        self.humanized_delay(conversation).await;
        self.channel
            .send(OutboundMessage::text(conversation, reply))
            .await?;

        if decision.next_question.is_some() && !lead.handoff_sent {
            self.maybe_schedule_reminder(conversation);
        }

        Ok(())
    }

    /// Processes a fired nudge under the conversation's lock.
    async fn process_reminder(&self, fired: ReminderFired) {
        let conversation = fired.conversation;
        let lock = self.conversation_lock(conversation);
        let _guard = lock.lock().await;

        // A fire that lost the race with a cancel is stale.
        if !self.reminders.take_if_current(conversation, fired.generation) {
            debug!(conversation = conversation.0, "discarding stale nudge");
            return;
        }

        if let Err(e) = self.send_reminder(conversation).await {
            error!(
                conversation = conversation.0,
                error = %e,
                "failed to send reminder"
            );
        }
    }

    async fn send_reminder(&self, conversation: ConversationId) -> Result<(), RentlineError> {
        let lead = match self.store.load(conversation).await? {
            Some(lead) => lead,
            None => return Ok(()),
        };

        if lead.is_terminal() {
            return Ok(());
        }

        let Some(question) = lead.last_question.filter(|q| !q.is_empty()) else {
            return Ok(());
        };

        debug!(conversation = conversation.0, "restating pending question");
        self.channel
            .send(OutboundMessage::text(
                conversation,
                format!("{}{}", prompts::REMINDER_PREFIX, question),
            ))
            .await
    }

    fn maybe_schedule_reminder(&self, conversation: ConversationId) {
        if self.dialogue.reminder_minutes == 0 {
            return;
        }
        self.reminders.schedule(
            conversation,
            Duration::from_secs(self.dialogue.reminder_minutes * 60),
        );
    }

    /// A randomized pause before each dialogue reply, with a typing
    /// indicator when the channel supports one. Disabled when the upper
    /// bound is zero.
    async fn humanized_delay(&self, conversation: ConversationId) {
        let min = self.dialogue.reply_delay_min_secs;
        let max = self.dialogue.reply_delay_max_secs;
        if max == 0 {
            return;
        }

        if self.channel.capabilities().supports_typing {
            if let Err(e) = self.channel.send_typing(conversation).await {
                debug!(error = %e, "failed to send typing indicator");
            }
        }

        let secs = if min >= max {
            max
        } else {
            rand::thread_rng().gen_range(min..=max)
        };
        tokio::time::sleep(Duration::from_secs(secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rentline_core::types::ChannelCapabilities;
    use rentline_core::{AdapterType, HealthStatus, PluginAdapter};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::time::timeout;

    const CONV: ConversationId = ConversationId(500);

    struct MockChannel {
        inbound: tokio::sync::Mutex<mpsc::Receiver<InboundMessage>>,
        outbox: Mutex<Vec<OutboundMessage>>,
    }

    impl MockChannel {
        fn new() -> (Arc<Self>, mpsc::Sender<InboundMessage>) {
            let (tx, rx) = mpsc::channel(16);
            (
                Arc::new(Self {
                    inbound: tokio::sync::Mutex::new(rx),
                    outbox: Mutex::new(Vec::new()),
                }),
                tx,
            )
        }

        fn sent(&self) -> Vec<String> {
            self.outbox.lock().unwrap().iter().map(|m| m.text.clone()).collect()
        }
    }

    #[async_trait]
    impl PluginAdapter for MockChannel {
        fn name(&self) -> &str {
            "mock-channel"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Channel
        }
        async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), RentlineError> {
            Ok(())
        }
    }

    #[async_trait]
    impl ChannelAdapter for MockChannel {
        fn capabilities(&self) -> ChannelCapabilities {
            ChannelCapabilities {
                supports_typing: false,
                max_message_length: None,
            }
        }
        async fn connect(&mut self) -> Result<(), RentlineError> {
            Ok(())
        }
        async fn send(&self, msg: OutboundMessage) -> Result<(), RentlineError> {
            self.outbox.lock().unwrap().push(msg);
            Ok(())
        }
        async fn receive(&self) -> Result<InboundMessage, RentlineError> {
            let mut rx = self.inbound.lock().await;
            rx.recv().await.ok_or_else(|| RentlineError::Channel {
                message: "mock channel closed".into(),
                source: None,
            })
        }
        async fn send_typing(&self, _conversation: ConversationId) -> Result<(), RentlineError> {
            Ok(())
        }
    }

    struct MemoryStore {
        leads: Mutex<HashMap<i64, Lead>>,
    }

    impl MemoryStore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                leads: Mutex::new(HashMap::new()),
            })
        }

        fn get(&self, conversation: ConversationId) -> Option<Lead> {
            self.leads.lock().unwrap().get(&conversation.0).cloned()
        }

        fn seed(&self, lead: Lead) {
            self.leads.lock().unwrap().insert(lead.conversation_id, lead);
        }
    }

    #[async_trait]
    impl PluginAdapter for MemoryStore {
        fn name(&self) -> &str {
            "memory"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), RentlineError> {
            Ok(())
        }
    }

    #[async_trait]
    impl LeadStore for MemoryStore {
        async fn initialize(&self) -> Result<(), RentlineError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), RentlineError> {
            Ok(())
        }
        async fn load(&self, conversation: ConversationId) -> Result<Option<Lead>, RentlineError> {
            Ok(self.get(conversation))
        }
        async fn save(&self, lead: &Lead) -> Result<(), RentlineError> {
            let mut stamped = lead.clone();
            stamped.touch();
            self.leads
                .lock()
                .unwrap()
                .insert(stamped.conversation_id, stamped);
            Ok(())
        }
        async fn delete(&self, conversation: ConversationId) -> Result<(), RentlineError> {
            self.leads.lock().unwrap().remove(&conversation.0);
            Ok(())
        }
    }

    struct MockSink {
        delivered: Mutex<Vec<Lead>>,
        fail: AtomicBool,
    }

    impl MockSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                delivered: Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
            })
        }

        fn delivered_count(&self) -> usize {
            self.delivered.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PluginAdapter for MockSink {
        fn name(&self) -> &str {
            "mock-sink"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 0, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Handoff
        }
        async fn health_check(&self) -> Result<HealthStatus, RentlineError> {
            Ok(HealthStatus::Healthy)
        }
        async fn shutdown(&self) -> Result<(), RentlineError> {
            Ok(())
        }
    }

    #[async_trait]
    impl LeadSink for MockSink {
        async fn deliver(&self, lead: &Lead) -> Result<(), RentlineError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RentlineError::Handoff {
                    message: "delivery refused".into(),
                    source: None,
                });
            }
            self.delivered.lock().unwrap().push(lead.clone());
            Ok(())
        }
    }

    fn quiet_dialogue() -> DialogueConfig {
        DialogueConfig {
            reminder_minutes: 0,
            reply_delay_min_secs: 0,
            reply_delay_max_secs: 0,
        }
    }

    struct Harness {
        channel: Arc<MockChannel>,
        inbound_tx: mpsc::Sender<InboundMessage>,
        store: Arc<MemoryStore>,
        sink: Arc<MockSink>,
        agent: AgentLoop,
    }

    fn harness_with(dialogue: DialogueConfig) -> Harness {
        let (channel, inbound_tx) = MockChannel::new();
        let store = MemoryStore::new();
        let sink = MockSink::new();
        let agent = AgentLoop::new(
            channel.clone(),
            store.clone(),
            sink.clone(),
            dialogue,
        );
        Harness {
            channel,
            inbound_tx,
            store,
            sink,
            agent,
        }
    }

    fn harness() -> Harness {
        harness_with(quiet_dialogue())
    }

    fn text_msg(text: &str) -> InboundMessage {
        InboundMessage {
            conversation: CONV,
            sender: SenderProfile::default(),
            content: InboundContent::Text(text.to_string()),
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[tokio::test]
    async fn auto_start_opens_without_consuming_the_first_message() {
        let h = harness();
        h.agent.ctx.process_inbound(text_msg("нас двое, сегодня")).await;

        assert_eq!(h.channel.sent(), vec![prompts::Q1.to_string()]);
        let lead = h.store.get(CONV).unwrap();
        assert_eq!(lead.last_question.as_deref(), Some(prompts::Q1));
        // The opener is not treated as an answer.
        assert!(lead.people_count.is_none());
        assert!(lead.move_in.is_none());
    }

    #[tokio::test]
    async fn full_interview_reaches_handoff() {
        let h = harness();
        for text in [
            "здравствуйте",
            "нас двое, заселение сегодня",
            "я менеджер в банке",
            "завтра после 7 вечера",
        ] {
            h.agent.ctx.process_inbound(text_msg(text)).await;
        }

        assert_eq!(
            h.channel.sent(),
            vec![
                prompts::Q1.to_string(),
                prompts::Q2.to_string(),
                prompts::Q3.to_string(),
                prompts::CLOSING.to_string(),
            ]
        );
        assert_eq!(h.sink.delivered_count(), 1);

        let lead = h.store.get(CONV).unwrap();
        assert!(lead.handoff_sent);
        assert!(lead.paused);
        assert_eq!(lead.people_count, Some(2));
        assert_eq!(lead.move_in.as_deref(), Some("today"));
        assert_eq!(lead.employment.as_deref(), Some("я менеджер в банке"));
        assert_eq!(lead.showing_time.as_deref(), Some("tomorrow after 19:00"));
    }

    #[tokio::test]
    async fn failed_handoff_is_retried_on_the_next_turn() {
        let h = harness();
        h.sink.fail.store(true, Ordering::SeqCst);

        for text in [
            "привет",
            "нас трое, через 2 недели",
            "водитель",
            "сегодня в 18:00",
        ] {
            h.agent.ctx.process_inbound(text_msg(text)).await;
        }

        let lead = h.store.get(CONV).unwrap();
        assert!(!lead.handoff_sent);
        assert!(!lead.paused);
        assert_eq!(h.sink.delivered_count(), 0);

        let last = h.channel.sent().pop().unwrap();
        assert!(last.starts_with(prompts::HANDOFF_FAILED_NOTICE));
        assert!(last.contains(prompts::Q1));

        // Delivery works again: the very next turn retries and succeeds.
        h.sink.fail.store(false, Ordering::SeqCst);
        h.agent.ctx.process_inbound(text_msg("алло?")).await;

        assert_eq!(h.sink.delivered_count(), 1);
        let lead = h.store.get(CONV).unwrap();
        assert!(lead.handoff_sent);
        assert!(lead.paused);
        assert_eq!(h.channel.sent().pop().unwrap(), prompts::CLOSING);
    }

    #[tokio::test]
    async fn restart_discards_the_record() {
        let h = harness();
        let mut seeded = Lead::new(CONV, &SenderProfile::default());
        seeded.people_count = Some(4);
        seeded.last_question = Some(prompts::Q2.to_string());
        h.store.seed(seeded);

        let restart = InboundMessage {
            conversation: CONV,
            sender: SenderProfile::default(),
            content: InboundContent::Restart,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        h.agent.ctx.process_inbound(restart).await;

        assert!(h.store.get(CONV).is_none());
        assert_eq!(h.channel.sent(), vec![prompts::Q1.to_string()]);
    }

    #[tokio::test]
    async fn unsupported_content_asks_for_text() {
        let h = harness();
        let voice = InboundMessage {
            conversation: CONV,
            sender: SenderProfile::default(),
            content: InboundContent::Unsupported,
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        };
        h.agent.ctx.process_inbound(voice).await;

        assert_eq!(h.channel.sent(), vec![prompts::ASK_FOR_TEXT.to_string()]);
        // No record is created for a message the interview cannot read.
        assert!(h.store.get(CONV).is_none());
    }

    #[tokio::test]
    async fn terminal_conversation_repeats_closing_only() {
        let h = harness();
        let mut seeded = Lead::new(CONV, &SenderProfile::default());
        seeded.handoff_sent = true;
        seeded.paused = true;
        h.store.seed(seeded);

        h.agent.ctx.process_inbound(text_msg("есть новости?")).await;

        assert_eq!(h.channel.sent(), vec![prompts::CLOSING.to_string()]);
        assert_eq!(h.sink.delivered_count(), 0);
    }

    #[tokio::test]
    async fn question_turns_schedule_a_nudge_and_handoff_does_not() {
        let mut dialogue = quiet_dialogue();
        dialogue.reminder_minutes = 30;
        let h = harness_with(dialogue);

        h.agent.ctx.process_inbound(text_msg("привет")).await;
        assert!(h.agent.ctx.reminders.is_pending(CONV));

        for text in ["нас двое, сегодня", "инженер", "завтра в 10"] {
            h.agent.ctx.process_inbound(text_msg(text)).await;
        }
        // The interview is over; nothing is pending.
        assert!(!h.agent.ctx.reminders.is_pending(CONV));
        let lead = h.store.get(CONV).unwrap();
        assert!(lead.handoff_sent);
    }

    #[tokio::test]
    async fn fired_nudge_restates_the_pending_question() {
        let h = harness();
        let mut seeded = Lead::new(CONV, &SenderProfile::default());
        seeded.people_count = Some(2);
        seeded.move_in = Some("today".into());
        seeded.last_question = Some(prompts::Q2.to_string());
        h.store.seed(seeded);

        let generation = h
            .agent
            .ctx
            .reminders
            .schedule(CONV, Duration::from_secs(600));
        h.agent
            .ctx
            .process_reminder(ReminderFired {
                conversation: CONV,
                generation,
            })
            .await;

        assert_eq!(
            h.channel.sent(),
            vec![format!("{}{}", prompts::REMINDER_PREFIX, prompts::Q2)]
        );
        assert!(!h.agent.ctx.reminders.is_pending(CONV));
    }

    #[tokio::test]
    async fn stale_nudge_is_discarded() {
        let h = harness();
        let mut seeded = Lead::new(CONV, &SenderProfile::default());
        seeded.last_question = Some(prompts::Q1.to_string());
        h.store.seed(seeded);

        let generation = h
            .agent
            .ctx
            .reminders
            .schedule(CONV, Duration::from_secs(600));
        // A message arrived in the meantime and cancelled the nudge.
        h.agent.ctx.reminders.cancel(CONV);

        h.agent
            .ctx
            .process_reminder(ReminderFired {
                conversation: CONV,
                generation,
            })
            .await;

        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn nudge_skips_terminal_conversations() {
        let h = harness();
        let mut seeded = Lead::new(CONV, &SenderProfile::default());
        seeded.handoff_sent = true;
        seeded.paused = true;
        seeded.last_question = Some(prompts::Q3.to_string());
        h.store.seed(seeded);

        let generation = h
            .agent
            .ctx
            .reminders
            .schedule(CONV, Duration::from_secs(600));
        h.agent
            .ctx
            .process_reminder(ReminderFired {
                conversation: CONV,
                generation,
            })
            .await;

        assert!(h.channel.sent().is_empty());
    }

    #[tokio::test]
    async fn run_loop_processes_messages_until_cancelled() {
        let Harness {
            channel,
            inbound_tx,
            mut agent,
            ..
        } = harness();
        let cancel = CancellationToken::new();

        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move { agent.run(run_cancel).await });

        inbound_tx.send(text_msg("привет")).await.unwrap();

        // Wait for the spawned turn to produce the opener.
        timeout(Duration::from_secs(2), async {
            loop {
                if !channel.sent().is_empty() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("reply should arrive");

        assert_eq!(channel.sent(), vec![prompts::Q1.to_string()]);

        cancel.cancel();
        timeout(Duration::from_secs(2), handle)
            .await
            .expect("loop should stop")
            .unwrap()
            .unwrap();
    }
}
