//! Best-effort JSON normalization for uploaded records.
//!
//! Parsing runs through an ordered list of strategies and stops at the first
//! one that succeeds. Every strategy is a pure function, so each can be
//! exercised on its own.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static RE_TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());
static RE_BARE_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_\-]*)\s*:"#).unwrap());

const BOM: char = '\u{feff}';

/// A single parse attempt. `None` means "try the next strategy".
pub type Strategy = fn(&str) -> Option<Value>;

/// Strategies in the order they are attempted.
pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("strict", parse_strict),
    ("repaired", parse_repaired),
    ("json_lines", parse_json_lines),
];

/// Normalizes raw text into zero or more structured records.
///
/// Arrays are flattened into their elements, any other value becomes a
/// single record. Returns an empty vec when nothing parses.
pub fn normalize(raw: &str) -> Vec<Value> {
    let cleaned = preclean(raw);
    if cleaned.is_empty() {
        return Vec::new();
    }

    match first_success(STRATEGIES, &cleaned) {
        Some((name, value)) => {
            tracing::debug!(strategy = name, "structured input normalized");
            into_records(value)
        }
        None => Vec::new(),
    }
}

/// Runs `strategies` in order and returns the first result with its name.
pub fn first_success(strategies: &[(&'static str, Strategy)], input: &str) -> Option<(&'static str, Value)> {
    strategies
        .iter()
        .find_map(|(name, strategy)| strategy(input).map(|v| (*name, v)))
}

/// Strips a leading BOM, maps typographic quotes to ASCII and trims.
pub fn preclean(raw: &str) -> String {
    raw.trim_start_matches(BOM)
        .chars()
        .map(|c| match c {
            '\u{201c}' | '\u{201d}' | '\u{201e}' | '\u{201f}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201a}' | '\u{201b}' => '\'',
            other => other,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn parse_strict(input: &str) -> Option<Value> {
    serde_json::from_str(input).ok()
}

/// Removes trailing commas and quotes bare object keys, then parses strictly.
pub fn parse_repaired(input: &str) -> Option<Value> {
    let repaired = repair(input);
    if repaired == input {
        return None;
    }
    parse_strict(&repaired)
}

/// One value per non-blank line. Needs at least two lines to apply.
pub fn parse_json_lines(input: &str) -> Option<Value> {
    let lines: Vec<&str> = input.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() < 2 {
        return None;
    }

    lines
        .iter()
        .map(|line| parse_strict(line).or_else(|| parse_repaired(line)))
        .collect::<Option<Vec<Value>>>()
        .map(Value::Array)
}

/// Repairs only the text between string literals, so commas and colons
/// inside values are left alone.
fn repair(input: &str) -> String {
    map_unquoted(input, |segment| {
        let without_commas = RE_TRAILING_COMMA.replace_all(segment, "$1");
        RE_BARE_KEY
            .replace_all(&without_commas, "$1\"$2\":")
            .into_owned()
    })
}

/// Applies `f` to every span outside double-quoted strings and copies the
/// strings through unchanged. An unterminated string runs to the end.
fn map_unquoted(input: &str, f: impl Fn(&str) -> String) -> String {
    let mut out = String::with_capacity(input.len());
    let mut plain = String::new();
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        if c != '"' {
            plain.push(c);
            continue;
        }
        out.push_str(&f(&plain));
        plain.clear();
        out.push(c);

        while let Some(c) = chars.next() {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => break,
                _ => {}
            }
        }
    }

    out.push_str(&f(&plain));
    out
}

fn into_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}
