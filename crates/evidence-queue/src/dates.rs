//! Normalization of human-entered dates to `YYYY-MM-DD`.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;

/// Sentinel rendered for dates that could not be understood.
pub const UNKNOWN_DATE: &str = "Unknown";

static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());
static RE_APPROXIMATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(circa|ca\.|c\.)\s*").unwrap());
static RE_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());
static RE_YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})$").unwrap());

/// Full-date formats, tried in order. Slash dates are read month-first.
const DAY_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%b %d, %Y",
    "%b %d %Y",
    "%b. %d, %Y",
];

const MONTH_FORMATS: &[&str] = &["%d %B %Y", "%d %b %Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizedDate {
    Date(NaiveDate),
    Unknown,
}

impl NormalizedDate {
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

impl fmt::Display for NormalizedDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Unknown => write!(f, "{}", UNKNOWN_DATE),
        }
    }
}

/// Parses a free-form date. Unrecognized input yields `Unknown`.
pub fn normalize_date(raw: &str) -> NormalizedDate {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return NormalizedDate::Unknown;
    }

    parse_cleaned(&cleaned)
        .map(NormalizedDate::Date)
        .unwrap_or(NormalizedDate::Unknown)
}

fn clean(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_prefix = RE_APPROXIMATE.replace(trimmed, "");
    let without_ordinals = RE_ORDINAL.replace_all(&without_prefix, "$1");
    without_ordinals
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_cleaned(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    // Timestamps such as "1880-03-15 10:00:00" or "1880-03-15T10:00".
    if s.len() > 10 && s.is_char_boundary(10) {
        if let Ok(d) = NaiveDate::parse_from_str(&s[..10], "%Y-%m-%d") {
            return Some(d);
        }
    }

    if let Some(d) = DAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
    {
        return Some(d);
    }

    if let Some(caps) = RE_YEAR_MONTH.captures(s) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, 1);
    }

    let first_of_month = format!("1 {}", s.replace(',', ""));
    if let Some(d) = MONTH_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&first_of_month, fmt).ok())
    {
        return Some(d);
    }

    if RE_YEAR.is_match(s) {
        let year: i32 = s.parse().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    None
}
