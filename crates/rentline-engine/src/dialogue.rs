// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field applier, dialogue state machine, and stuck detector.
//!
//! The interview state is never stored as an enum: it is recomputed every
//! turn as a pure function of which fields are populated, so identical
//! field presence always yields the identical next prompt. That keeps the
//! machine idempotent under replay and immune to drift after a partial
//! persistence write.

use rentline_core::Lead;
use tracing::debug;

use crate::extract::{extract_move_in, extract_people_count, extract_showing_time};
use crate::prompts;

/// Employment answers are stored verbatim, capped to this many characters.
pub const EMPLOYMENT_MAX_CHARS: usize = 160;
/// Raw showing answers are stored verbatim, capped to this many characters.
pub const SHOWING_MAX_CHARS: usize = 200;

/// The outcome of one interview turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The reply to send to the user.
    pub reply: String,
    /// The question the interview is now waiting on, if any.
    pub next_question: Option<String>,
    /// True when all required fields are present and the lead should be
    /// delivered to a human operator. The caller performs the delivery and
    /// reports the outcome back onto the record.
    pub handoff: bool,
}

fn cap_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Merges whatever the extractors find in `text` into the record, under a
/// first-write-wins policy: a populated field is never overwritten.
///
/// The party-size and move-in extractors run unconditionally. Employment
/// and showing answers are context-dependent: they are only accepted when
/// `last_question` shows the matching prompt was the one just asked.
/// Empty text is a no-op. Mutation only; there is no return value.
pub fn apply_extraction(lead: &mut Lead, text: &str) {
    let t = text.trim();
    if t.is_empty() {
        return;
    }

    if !lead.has_people_count() {
        if let Some(pc) = extract_people_count(t) {
            lead.people_count = Some(pc);
        }
    }

    if !lead.has_move_in() {
        if let Some(mv) = extract_move_in(t) {
            lead.move_in = Some(mv);
        }
    }

    let last_q = lead
        .last_question
        .as_deref()
        .unwrap_or("")
        .to_lowercase();

    // Employment: if we asked about work, accept any non-empty answer.
    if !lead.has_employment() && (last_q.contains("кем") || last_q.contains("работ")) {
        lead.employment = Some(cap_chars(t, EMPLOYMENT_MAX_CHARS));
    }

    // Showing: if we asked about the showing, store the raw reply and try
    // to parse a normalized slot from it.
    if last_q.contains("показ") {
        if !lead.has_showing_text() {
            lead.showing_text = Some(cap_chars(t, SHOWING_MAX_CHARS));
        }
        if !lead.has_showing_time() {
            if let Some(st) = extract_showing_time(t) {
                lead.showing_time = Some(st);
            }
        }
    }
}

/// Computes the next prompt from field presence alone.
///
/// Returns `(reply, next_question, handoff)`. Gating order: terminal
/// records get the closing message; then party size + move-in, employment,
/// and the showing slot are asked for in turn; once everything is present
/// the closing message is returned with the hand-off flag set.
pub fn next_question(lead: &Lead) -> (String, Option<String>, bool) {
    if lead.handoff_sent {
        return (prompts::CLOSING.to_string(), None, false);
    }

    if !lead.has_people_count() || !lead.has_move_in() {
        return (prompts::Q1.to_string(), Some(prompts::Q1.to_string()), false);
    }

    if !lead.has_employment() {
        return (prompts::Q2.to_string(), Some(prompts::Q2.to_string()), false);
    }

    if !lead.has_showing_time() && !lead.has_showing_text() {
        return (prompts::Q3.to_string(), Some(prompts::Q3.to_string()), false);
    }

    (prompts::CLOSING.to_string(), None, true)
}

/// The single entry point for one interview turn.
///
/// Applies extraction, updates the stuck counter, recomputes the next
/// prompt, escalates the wording after repeated non-progress, and records
/// the issued question in `last_question`.
pub fn decide_reply(lead: &mut Lead, text: &str) -> Decision {
    let before = lead.snapshot();
    apply_extraction(lead, text);
    let progressed = before != lead.snapshot();

    if progressed {
        lead.stuck_count = 0;
    } else {
        lead.stuck_count += 1;
    }

    let (mut reply, next_question, handoff) = next_question(lead);

    // No acknowledgment on the first unproductive turn: a single miss
    // should not sound scripted.
    let question_pending = lead
        .last_question
        .as_deref()
        .is_some_and(|q| !q.is_empty());
    if !progressed && question_pending && !lead.handoff_sent && lead.stuck_count >= 2 {
        debug!(
            conversation = lead.conversation_id,
            stuck_count = lead.stuck_count,
            "no progress, escalating prompt wording"
        );
        reply = format!("{}{}", prompts::STUCK_PREFIX, reply);
    }

    if let Some(q) = &next_question {
        lead.last_question = Some(q.clone());
    }

    Decision {
        reply,
        next_question,
        handoff,
    }
}
