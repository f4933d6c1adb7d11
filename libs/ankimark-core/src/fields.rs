//! Sub-field extraction from raw card text.
//!
//! Each extractor returns the text with its markup removed together with the
//! extracted value. Extractors never trim; callers trim once all markup is gone.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::OnceLock;

fn deck_regex() -> &'static Regex {
    static DECK: OnceLock<Regex> = OnceLock::new();
    DECK.get_or_init(|| Regex::new(r"\|\|(.+?)\|\|").expect("Invalid deck regex"))
}

fn tag_regex() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| Regex::new(r"#(\w+)").expect("Invalid tag regex"))
}

/// Trailing `^<digits>`, optionally followed by whitespace.
pub(crate) fn back_reference_regex() -> &'static Regex {
    static BACK_REF: OnceLock<Regex> = OnceLock::new();
    BACK_REF.get_or_init(|| Regex::new(r"\^(\d+)\s*$").expect("Invalid back-reference regex"))
}

pub(crate) fn cloze_regex() -> &'static Regex {
    static CLOZE: OnceLock<Regex> = OnceLock::new();
    CLOZE.get_or_init(|| Regex::new(r"\{\{(.+?)\}\}").expect("Invalid cloze regex"))
}

/// Extract the first `||deck||` override and strip every `||...||` span.
pub fn extract_deck(text: &str) -> (String, Option<String>) {
    let deck = deck_regex()
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|deck| !deck.is_empty());
    let cleaned = deck_regex().replace_all(text, "").into_owned();
    (cleaned, deck)
}

/// Extract every `#tag` in order of appearance and strip them from the text.
pub fn extract_tags(text: &str) -> (String, Vec<String>) {
    let mut tags = Vec::new();
    for caps in tag_regex().captures_iter(text) {
        push_unique(&mut tags, &caps[1]);
    }
    let cleaned = tag_regex().replace_all(text, "").into_owned();
    (cleaned, tags)
}

/// Extract a trailing `^<id>` back-reference.
///
/// Text whose digits overflow an `i64` is returned untouched.
pub fn extract_back_reference(text: &str) -> (String, Option<i64>) {
    let Some(caps) = back_reference_regex().captures(text) else {
        return (text.to_string(), None);
    };
    let Ok(id) = caps[1].parse::<i64>() else {
        return (text.to_string(), None);
    };
    let start = caps.get(0).map_or(text.len(), |m| m.start());
    (text[..start].to_string(), Some(id))
}

/// Rewrite `{{word}}` as `{{c1::word}}`; spans already naming a group pass through.
pub fn normalize_cloze(text: &str) -> Cow<'_, str> {
    cloze_regex().replace_all(text, |caps: &Captures<'_>| {
        let inner = &caps[1];
        if inner.contains("::") {
            caps[0].to_string()
        } else {
            format!("{{{{c1::{inner}}}}}")
        }
    })
}

/// Append `tag` unless it is already present (case-insensitive).
pub fn push_unique(tags: &mut Vec<String>, tag: &str) {
    let lowered = tag.to_lowercase();
    if !tags.iter().any(|t| t.to_lowercase() == lowered) {
        tags.push(tag.to_string());
    }
}
