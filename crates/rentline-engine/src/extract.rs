// SPDX-FileCopyrightText: 2026 Rentline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field extractors: pure pattern-matching parsers over noisy free text.
//!
//! Each extractor maps raw text to an optional normalized value. They are
//! deterministic, case-insensitive, and never fail: no match yields `None`,
//! never an error. Rules are tried in a fixed priority order and the first
//! hit wins; no attempt is made to reconcile multiple candidates in one
//! message. Russian and English variants are matched where the audience
//! uses both.

use std::sync::LazyLock;

use regex::Regex;

/// Russian collective numerals accepted after "нас", mapped to party sizes.
fn word_to_count(word: &str) -> Option<u32> {
    match word {
        "двое" => Some(2),
        "трое" => Some(3),
        "четверо" => Some(4),
        "пятеро" => Some(5),
        "шестеро" => Some(6),
        _ => None,
    }
}

/// Russian month-name prefixes (first three characters) to English months.
fn month_name(prefix: &str) -> Option<&'static str> {
    match prefix {
        "янв" => Some("January"),
        "фев" => Some("February"),
        "мар" => Some("March"),
        "апр" => Some("April"),
        "мая" | "май" => Some("May"),
        "июн" => Some("June"),
        "июл" => Some("July"),
        "авг" => Some("August"),
        "сен" => Some("September"),
        "окт" => Some("October"),
        "ноя" => Some("November"),
        "дек" => Some("December"),
        _ => None,
    }
}

static RE_WE_ARE_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bнас\s+(двое|трое|четверо|пятеро|шестеро)\b").unwrap()
});
static RE_WE_ARE_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bнас\s*[:\-]?\s*(\d{1,2})\b").unwrap());
static RE_COUNT_UNIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s*(чел|человек|people|persons)\b").unwrap());
static RE_UNIT_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(people|persons)\s*[:\-]?\s*(\d{1,2})").unwrap());

/// Extracts the party size from a free-text reply.
///
/// Priority: collective numeral after "нас", digit after "нас", digit with a
/// person/people unit (either word order), "вдвоем" → 2, "just me" → 1.
pub fn extract_people_count(text: &str) -> Option<u32> {
    let tl = text.trim().to_lowercase();
    if tl.is_empty() {
        return None;
    }

    if let Some(c) = RE_WE_ARE_WORD.captures(&tl) {
        return word_to_count(&c[1]);
    }
    if let Some(c) = RE_WE_ARE_DIGIT.captures(&tl) {
        return c[1].parse().ok();
    }
    if let Some(c) = RE_COUNT_UNIT.captures(&tl) {
        return c[1].parse().ok();
    }
    if let Some(c) = RE_UNIT_COUNT.captures(&tl) {
        return c[2].parse().ok();
    }

    if tl.contains("вдвоем") || tl.contains("вдвоём") {
        return Some(2);
    }
    if ["я одна", "только я", "just me", "only me"]
        .iter()
        .any(|p| tl.contains(p))
    {
        return Some(1);
    }

    None
}

static RE_IN_N_RU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"через\s*(\d{1,2})\s*(дн|дня|дней|нед|недел|мес|месяц|месяца|месяцев)").unwrap()
});
static RE_IN_N_EN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bin\s*(\d{1,2})\s*(day|days|week|weeks|month|months)\b").unwrap());
static RE_DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{1,2})\s*(январ\w*|феврал\w*|март\w*|апрел\w*|ма\w*|июн\w*|июл\w*|август\w*|сентябр\w*|октябр\w*|ноябр\w*|декабр\w*)",
    )
    .unwrap()
});

/// Extracts the move-in timing as a semantic bucket or lightly-normalized
/// phrase, deliberately never a resolved calendar date.
///
/// Priority: soon-bucket phrases, ASAP phrases, today, tomorrow, a relative
/// "in N days/weeks/months" (RU or EN), an absolute "day + month name".
pub fn extract_move_in(text: &str) -> Option<String> {
    let tl = text.trim().to_lowercase();
    if tl.is_empty() {
        return None;
    }

    if ["на днях", "в ближайшие дни", "в ближайшее время", "скоро", "soon", "next few days"]
        .iter()
        .any(|p| tl.contains(p))
    {
        return Some("в ближайшие дни".to_string());
    }
    if ["asap", "срочно", "как можно скорее", "сразу"]
        .iter()
        .any(|p| tl.contains(p))
    {
        return Some("ASAP".to_string());
    }
    if tl.contains("сегодня") || tl.contains("today") {
        return Some("today".to_string());
    }
    if tl.contains("завтра") || tl.contains("tomorrow") {
        return Some("tomorrow".to_string());
    }

    if let Some(c) = RE_IN_N_RU.captures(&tl) {
        let n: u32 = c[1].parse().ok()?;
        let unit = &c[2];
        let bucket = if unit.starts_with('д') {
            format!("через {n} дней")
        } else if unit.starts_with('н') {
            format!("через {n} недель")
        } else {
            format!("через {n} месяцев")
        };
        return Some(bucket);
    }

    if let Some(c) = RE_IN_N_EN.captures(&tl) {
        let n: u32 = c[1].parse().ok()?;
        return Some(format!("in {n} {}", &c[2]));
    }

    if let Some(c) = RE_DAY_MONTH.captures(&tl) {
        let day = &c[1];
        let prefix: String = c[2].chars().take(3).collect();
        // Unknown month stems fall back to the raw matched word.
        let month = month_name(&prefix).unwrap_or(&c[2]);
        return Some(format!("{day} {month}"));
    }

    None
}

static RE_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})[:.](\d{2})\b").unwrap());
static RE_BARE_HOUR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(\d{1,2})\b").unwrap());

/// Extracts a showing-time slot as a compact normalized string for the
/// operator, e.g. `"today 19:00"`, `"tomorrow after 20:00"`, `"tomorrow"`.
///
/// An optional day bucket (today/tomorrow) and an optional clock component
/// compose; either may stand alone. A bare hour of 1–11 with an evening/PM
/// marker is shifted into the 24-hour range.
pub fn extract_showing_time(text: &str) -> Option<String> {
    let tl = text.trim().to_lowercase();
    if tl.is_empty() {
        return None;
    }

    let day = if tl.contains("сегодня") || tl.contains("today") {
        Some("today")
    } else if tl.contains("завтра") || tl.contains("tomorrow") {
        Some("tomorrow")
    } else {
        None
    };

    let after = tl.contains("после") || tl.contains("after");
    let prefix = if after { "after " } else { "" };

    // Explicit HH:MM (or HH.MM) beats a bare hour.
    if let Some(c) = RE_CLOCK.captures(&tl) {
        let hh: u32 = c[1].parse().ok()?;
        let mm = &c[2];
        return Some(match day {
            Some(d) => format!("{d} {prefix}{hh:02}:{mm}"),
            None => format!("{prefix}{hh:02}:{mm}"),
        });
    }

    if let Some(c) = RE_BARE_HOUR.captures(&tl) {
        let mut hh: u32 = c[1].parse().ok()?;
        let pm = ["вечера", "pm", "p.m"].iter().any(|w| tl.contains(w));
        if pm && (1..=11).contains(&hh) {
            hh += 12;
        }
        return Some(match day {
            Some(d) => format!("{d} {prefix}{hh:02}:00"),
            None => format!("{prefix}{hh:02}:00"),
        });
    }

    day.map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn people_count_collective_numerals() {
        assert_eq!(extract_people_count("нас двое"), Some(2));
        assert_eq!(extract_people_count("Нас трое, с ребенком"), Some(3));
        assert_eq!(extract_people_count("нас четверо"), Some(4));
        assert_eq!(extract_people_count("нас пятеро"), Some(5));
        assert_eq!(extract_people_count("нас шестеро"), Some(6));
    }

    #[test]
    fn people_count_digits_after_marker() {
        assert_eq!(extract_people_count("нас 2"), Some(2));
        assert_eq!(extract_people_count("нас: 3"), Some(3));
        assert_eq!(extract_people_count("нас - 4 и собака"), Some(4));
    }

    #[test]
    fn people_count_with_unit_word() {
        assert_eq!(extract_people_count("3 человека"), Some(3));
        assert_eq!(extract_people_count("будет 2 чел"), Some(2));
        assert_eq!(extract_people_count("2 people"), Some(2));
        assert_eq!(extract_people_count("people: 4"), Some(4));
    }

    #[test]
    fn people_count_phrases() {
        assert_eq!(extract_people_count("мы вдвоем"), Some(2));
        assert_eq!(extract_people_count("вдвоём с женой"), Some(2));
        assert_eq!(extract_people_count("я одна"), Some(1));
        assert_eq!(extract_people_count("только я"), Some(1));
        assert_eq!(extract_people_count("just me"), Some(1));
    }

    #[test]
    fn people_count_first_rule_wins() {
        // The collective numeral outranks the later digit.
        assert_eq!(extract_people_count("нас двое, приедем в 3"), Some(2));
    }

    #[test]
    fn people_count_no_match() {
        assert_eq!(extract_people_count(""), None);
        assert_eq!(extract_people_count("скоро заедем"), None);
        assert_eq!(extract_people_count("большая семья"), None);
    }

    #[test]
    fn move_in_buckets() {
        assert_eq!(extract_move_in("на днях").as_deref(), Some("в ближайшие дни"));
        assert_eq!(extract_move_in("скоро").as_deref(), Some("в ближайшие дни"));
        assert_eq!(extract_move_in("soon please").as_deref(), Some("в ближайшие дни"));
        assert_eq!(extract_move_in("как можно скорее").as_deref(), Some("ASAP"));
        assert_eq!(extract_move_in("СРОЧНО").as_deref(), Some("ASAP"));
        assert_eq!(extract_move_in("заселение сегодня").as_deref(), Some("today"));
        assert_eq!(extract_move_in("завтра утром").as_deref(), Some("tomorrow"));
    }

    #[test]
    fn move_in_bucket_priority_over_relative() {
        // "скоро" wins even when a relative expression is also present.
        assert_eq!(
            extract_move_in("скоро, через 2 недели").as_deref(),
            Some("в ближайшие дни")
        );
    }

    #[test]
    fn move_in_relative_russian() {
        assert_eq!(extract_move_in("через 3 дня").as_deref(), Some("через 3 дней"));
        assert_eq!(extract_move_in("через 2 недели").as_deref(), Some("через 2 недель"));
        assert_eq!(extract_move_in("через1 месяц").as_deref(), Some("через 1 месяцев"));
    }

    #[test]
    fn move_in_relative_english() {
        assert_eq!(extract_move_in("in 5 days").as_deref(), Some("in 5 days"));
        assert_eq!(extract_move_in("in 2 weeks maybe").as_deref(), Some("in 2 weeks"));
    }

    #[test]
    fn move_in_absolute_day_month() {
        assert_eq!(extract_move_in("15 января").as_deref(), Some("15 January"));
        assert_eq!(extract_move_in("1 сентября").as_deref(), Some("1 September"));
        assert_eq!(extract_move_in("20 мая").as_deref(), Some("20 May"));
    }

    #[test]
    fn move_in_no_match() {
        assert_eq!(extract_move_in(""), None);
        assert_eq!(extract_move_in("пока не знаю"), None);
    }

    #[test]
    fn showing_time_explicit_clock() {
        assert_eq!(
            extract_showing_time("завтра в 19:00").as_deref(),
            Some("tomorrow 19:00")
        );
        assert_eq!(
            extract_showing_time("сегодня после 20:00").as_deref(),
            Some("today after 20:00")
        );
        assert_eq!(extract_showing_time("в 7:30").as_deref(), Some("07:30"));
    }

    #[test]
    fn showing_time_bare_hour_pm_shift() {
        // Bare hour 1–11 with an evening marker is shifted to 24-hour form.
        assert_eq!(
            extract_showing_time("завтра после 7 вечера").as_deref(),
            Some("tomorrow after 19:00")
        );
        assert_eq!(extract_showing_time("today 9 pm").as_deref(), Some("today 21:00"));
        // Already-24-hour values are left alone.
        assert_eq!(
            extract_showing_time("сегодня в 19 вечера").as_deref(),
            Some("today 19:00")
        );
    }

    #[test]
    fn showing_time_bare_hour_without_pm() {
        assert_eq!(extract_showing_time("завтра в 10").as_deref(), Some("tomorrow 10:00"));
        assert_eq!(extract_showing_time("после 8").as_deref(), Some("after 08:00"));
    }

    #[test]
    fn showing_time_day_bucket_alone() {
        assert_eq!(extract_showing_time("сегодня").as_deref(), Some("today"));
        assert_eq!(extract_showing_time("можно завтра?").as_deref(), Some("tomorrow"));
    }

    #[test]
    fn showing_time_no_match() {
        assert_eq!(extract_showing_time(""), None);
        assert_eq!(extract_showing_time("позвоните мне"), None);
    }
}
