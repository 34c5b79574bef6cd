// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTML lead card rendering for the leads chat.
//!
//! Telegram HTML parse mode only honors a small tag set; everything that
//! came from the user must be entity-escaped so a stray `<` in an answer
//! cannot break the card.

use rentline_core::Lead;

/// Escapes text for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders the lead card posted to the leads chat.
///
/// Only populated fields appear. The raw showing answer is shown next to
/// the normalized slot so the operator sees both what the client wrote and
/// what the parser made of it.
pub fn lead_card(lead: &Lead) -> String {
    let mut parts = vec!["🟢 <b>НОВЫЙ ЛИД</b>".to_string()];

    if let Some(pc) = lead.people_count {
        parts.push(format!("👥 <b>Кол-во человек:</b> {pc}"));
    }
    if let Some(mv) = lead.move_in.as_deref() {
        parts.push(format!("📦 <b>Заселение:</b> {}", escape_html(mv)));
    }
    if let Some(emp) = lead.employment.as_deref() {
        parts.push(format!("💼 <b>Кем работает/статус:</b> {}", escape_html(emp)));
    }
    if let Some(raw) = lead.showing_text.as_deref() {
        parts.push(format!(
            "🕒 <b>Показ (как написал клиент):</b> {}",
            escape_html(raw)
        ));
    }
    if let Some(slot) = lead.showing_time.as_deref() {
        parts.push(format!(
            "🧭 <b>Показ (нормализовано):</b> {}",
            escape_html(slot)
        ));
    }

    if let Some(username) = lead.username.as_deref() {
        parts.push(format!(
            "🔗 <b>Ссылка на клиента:</b> https://t.me/{}",
            escape_html(username)
        ));
    }
    let user_ref = lead.user_id.unwrap_or(lead.conversation_id);
    parts.push(format!("🆔 <b>tg://user?id=</b>{user_ref}"));

    parts.join("\n")
}
