// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Interview prompt texts.
//!
//! The applier's context heuristics key off these texts: the employment
//! prompt must contain a `кем`/`работ` root and the showing prompt a
//! `показ` root, so reworded prompts have to keep those stems.

/// Opening question: party size and move-in timing.
pub const Q1: &str =
    "Здравствуйте, подскажите пожалуйста, сколько вас человек и когда примерно планируете заселение?";

/// Second question: occupation.
pub const Q2: &str = "Спасибо! Кем вы работаете ?";

/// Third question: showing appointment.
pub const Q3: &str = "Когда удобно подъехать на показ — сегодня или завтра? ";

/// Closing message, sent once the interview is complete and on every turn
/// after a successful hand-off.
pub const CLOSING: &str = "Понял. Менеджер уже получил ваш запрос и свяжется с вами.";

/// Prepended to the reply on the second and later consecutive turns that
/// extracted nothing new. Deliberately suppressed on the first miss.
pub const STUCK_PREFIX: &str = "Не совсем понял. ";

/// Prepended to `last_question` when the idle nudge fires.
pub const REMINDER_PREFIX: &str = "Напомню 😊 ";

/// Shown when the lead could not be delivered to the operator; the pending
/// next question is appended so the interview can still continue.
pub const HANDOFF_FAILED_NOTICE: &str =
    "Я собрал данные, но не смог отправить менеджеру (техническая ошибка). Попробую отправить ещё раз.\n\n";

/// Reply to voice messages and other content the interview cannot read.
pub const ASK_FOR_TEXT: &str = "Пожалуйста, напишите текстом 😊";
