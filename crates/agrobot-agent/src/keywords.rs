// SPDX-FileCopyrightText: 2026 Agrobot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword vocabularies and answer format checks.
//!
//! Vocabulary matches compare the whole message after lowercasing,
//! dropping apostrophes and collapsing punctuation to spaces, so "Hi!" and
//! "What's up?" match "hi" and "whats up". Direction is the exception and
//! is found anywhere in the message as a whole word.

use std::sync::LazyLock;

use agrobot_core::Direction;
use regex::Regex;

const GREETINGS: &[&str] = &["hi", "hello", "hey", "whats up"];
const FAREWELLS: &[&str] = &["bye", "good bye", "later"];
const YES: &[&str] = &["ok", "yes", "y", "yep"];
const NO: &[&str] = &["no", "n", "nope"];

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static PRICE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(\.\d+)?$").unwrap());
static NOT_PHONE_CHAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^-+\s\d()]").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Lowercased words of `text`, apostrophes removed.
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\'', '\u{2019}'], "")
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn matches_any(text: &str, vocabulary: &[&str]) -> bool {
    let canonical = words(text).join(" ");
    vocabulary.iter().any(|k| *k == canonical)
}

pub fn is_greeting(text: &str) -> bool {
    matches_any(text, GREETINGS)
}

pub fn is_farewell(text: &str) -> bool {
    matches_any(text, FAREWELLS)
}

pub fn is_yes(text: &str) -> bool {
    matches_any(text, YES)
}

pub fn is_no(text: &str) -> bool {
    matches_any(text, NO)
}

/// Direction named in free text. A message naming both or neither is `None`.
pub fn direction(text: &str) -> Option<Direction> {
    let words = words(text);
    let buy = words.iter().any(|w| w == "buy");
    let sell = words.iter().any(|w| w == "sell");
    match (buy, sell) {
        (true, false) => Some(Direction::Buy),
        (false, true) => Some(Direction::Sell),
        _ => None,
    }
}

/// A positive whole number such as `"12"`.
pub fn parse_quantity(text: &str) -> Option<u32> {
    let text = text.trim();
    if !QUANTITY.is_match(text) {
        return None;
    }
    text.parse::<u32>().ok().filter(|q| *q > 0)
}

/// A positive decimal such as `"19.5"`.
pub fn parse_price(text: &str) -> Option<f64> {
    let text = text.trim();
    if !PRICE.is_match(text) {
        return None;
    }
    text.parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

/// Keep only phone-like characters. Requires at least one digit.
pub fn parse_phone(text: &str) -> Option<String> {
    let cleaned = NOT_PHONE_CHAR.replace_all(text, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    cleaned
        .chars()
        .any(|c| c.is_ascii_digit())
        .then_some(cleaned)
}

/// The first whitespace-separated token shaped like an email address.
pub fn parse_email(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|token| token.trim_end_matches(['.', ',', ';', '!', '?']))
        .find(|token| EMAIL.is_match(token))
        .map(str::to_string)
}
