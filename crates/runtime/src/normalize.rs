//! Normalizers for free-form user input.
//!
//! Tools call these on their raw arguments before talking to a provider.
//! A failure here is reported inside the tool result, never as a turn error.

use chrono::{Days, Local, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})[-/](\d{1,2})[-/](\d{4})$").expect("numeric date pattern is valid")
});

static CITY_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcity\b").expect("city pattern is valid"));

/// Textual formats tried in order after the numeric ones.
const TEXT_DATE_FORMATS: [&str; 4] = [
    "%d %b %Y", // 19 Feb 2026
    "%d %B %Y", // 19 February 2026
    "%b %d %Y", // Feb 19 2026
    "%B %d %Y", // February 19 2026
];

/// A user-supplied field that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("invalid date format '{0}': use YYYY-MM-DD, DD-MM-YYYY, DD/MM/YYYY or today/tomorrow")]
    Date(String),
}

/// Convert a user date into an ISO `YYYY-MM-DD` string.
///
/// `today` and `tomorrow` resolve against the local date at call time.
pub fn normalize_date(input: &str) -> Result<String, InvalidInput> {
    normalize_date_from(input, Local::now().date_naive())
}

/// [`normalize_date`] with an explicit reference date.
pub fn normalize_date_from(input: &str, today: NaiveDate) -> Result<String, InvalidInput> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::Empty("date"));
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "today" => return Ok(iso(today)),
        "tomorrow" => {
            return today
                .checked_add_days(Days::new(1))
                .map(iso)
                .ok_or_else(|| InvalidInput::Date(input.to_string()));
        }
        _ => {}
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(iso(date));
    }

    // Day first, month second. A match that is not a real calendar date is
    // final: later formats are not tried.
    if let Some(caps) = NUMERIC_DATE.captures(&lowered) {
        let day = caps[1].parse().ok();
        let month = caps[2].parse().ok();
        let year = caps[3].parse().ok();
        return match (year, month, day) {
            (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d)
                .map(iso)
                .ok_or_else(|| InvalidInput::Date(input.to_string())),
            _ => Err(InvalidInput::Date(input.to_string())),
        };
    }

    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .map(iso)
        .ok_or_else(|| InvalidInput::Date(input.to_string()))
}

/// Clean up a city name: drop the word "city", trim, title-case.
///
/// The result is not checked against any list of real places.
pub fn normalize_city(input: &str) -> Result<String, InvalidInput> {
    if input.trim().is_empty() {
        return Err(InvalidInput::Empty("city"));
    }

    let stripped = CITY_WORD.replace_all(input, " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(InvalidInput::Empty("city"));
    }

    Ok(title_case(&collapsed))
}

/// Trim and upper-case a currency code. Unknown codes are not rejected here.
pub fn normalize_currency(input: &str) -> Result<String, InvalidInput> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::Empty("currency"));
    }
    Ok(trimmed.to_uppercase())
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

// Upper-case the first letter of every alphabetic run, lower-case the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
