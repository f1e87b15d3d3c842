//! Date helper functions
//!
//! Dates arrive from the content API as ISO 8601 strings and are rendered with
//! date-fns style patterns (`dd MMM y`, `d 'de' MMMM 'de' yyyy`) using
//! Brazilian Portuguese month and weekday names.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use thiserror::Error;

/// Date parsing and formatting errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Unparseable date: {0:?}")]
    Unparseable(String),

    #[error("Unknown format token: {0:?}")]
    UnknownToken(String),

    #[error("Unterminated quoted text in format pattern")]
    UnterminatedQuote,
}

const MONTHS_ABBREVIATED: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

const MONTHS_WIDE: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

const MONTHS_NARROW: [&str; 12] = ["j", "f", "m", "a", "m", "j", "j", "a", "s", "o", "n", "d"];

// Indexed from Sunday
const WEEKDAYS_ABBREVIATED: [&str; 7] = ["dom", "seg", "ter", "qua", "qui", "sex", "sáb"];

const WEEKDAYS_WIDE: [&str; 7] = [
    "domingo",
    "segunda-feira",
    "terça-feira",
    "quarta-feira",
    "quinta-feira",
    "sexta-feira",
    "sábado",
];

const WEEKDAYS_NARROW: [&str; 7] = ["D", "S", "T", "Q", "Q", "S", "S"];

/// A piece of a parsed format pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Field(char, usize),
}

/// Formats content API dates in a fixed timezone with pt-BR names
#[derive(Debug, Clone, Copy)]
pub struct DateFormatter {
    tz: Tz,
}

impl Default for DateFormatter {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl DateFormatter {
    /// Create a formatter rendering in the given timezone
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Timezone this formatter renders in
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Format `date` with a date-fns style `pattern`
    pub fn format(&self, date: &str, pattern: &str) -> Result<String, DateError> {
        let local = self.to_local(date)?;
        let pieces = parse_pattern(pattern)?;

        let mut out = String::with_capacity(pattern.len() + 8);
        for piece in pieces {
            match piece {
                Piece::Literal(text) => out.push_str(&text),
                Piece::Field(ch, len) => out.push_str(&render_field(&local, ch, len)?),
            }
        }
        Ok(out)
    }

    /// Parse `date` into wall-clock time in this formatter's timezone
    fn to_local(&self, date: &str) -> Result<NaiveDateTime, DateError> {
        let date = date.trim();

        if let Some(instant) = parse_instant(date) {
            return Ok(instant.with_timezone(&self.tz).naive_local());
        }

        // Without an offset the value is already wall-clock time
        if let Ok(naive) = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f") {
            return Ok(naive);
        }
        if let Ok(day) = NaiveDate::parse_from_str(date, "%Y-%m-%d") {
            return Ok(day.and_time(chrono::NaiveTime::MIN));
        }

        Err(DateError::Unparseable(date.to_string()))
    }
}

/// Format a date string with a date-fns style pattern, rendered in UTC
///
/// # Examples
/// ```ignore
/// format_date("2021-03-25T00:00:00Z", "dd MMM y") // -> Ok("25 mar 2021")
/// ```
pub fn format_date(date: &str, pattern: &str) -> Result<String, DateError> {
    DateFormatter::default().format(date, pattern)
}

/// Parse a date carrying an explicit offset
fn parse_instant(date: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date) {
        return Some(dt);
    }
    // The content API writes offsets without a colon: 2021-03-25T19:25:28+0000
    DateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S%.f%z").ok()
}

fn parse_pattern(pattern: &str) -> Result<Vec<Piece>, DateError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '\'' {
            // '' outside quotes is a single quote
            if chars.get(i + 1) == Some(&'\'') {
                literal.push('\'');
                i += 2;
                continue;
            }

            i += 1;
            let mut closed = false;
            while i < chars.len() {
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        literal.push('\'');
                        i += 2;
                        continue;
                    }
                    closed = true;
                    i += 1;
                    break;
                }
                literal.push(chars[i]);
                i += 1;
            }
            if !closed {
                return Err(DateError::UnterminatedQuote);
            }
        } else if ch.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i] == ch {
                i += 1;
            }
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Field(ch, i - start));
        } else {
            literal.push(ch);
            i += 1;
        }
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }

    Ok(pieces)
}

fn render_field(date: &NaiveDateTime, ch: char, len: usize) -> Result<String, DateError> {
    let month = date.month0() as usize;
    let weekday = date.weekday().num_days_from_sunday() as usize;

    let value = match (ch, len) {
        ('y', 2) => format!("{:02}", date.year().rem_euclid(100)),
        ('y', n) => format!("{:0width$}", date.year(), width = n),

        ('M', 1) => date.month().to_string(),
        ('M', 2) => format!("{:02}", date.month()),
        ('M', 3) => MONTHS_ABBREVIATED[month].to_string(),
        ('M', 4) => MONTHS_WIDE[month].to_string(),
        ('M', 5) => MONTHS_NARROW[month].to_string(),

        ('d', 1) => date.day().to_string(),
        ('d', 2) => format!("{:02}", date.day()),

        ('E', 1..=3) => WEEKDAYS_ABBREVIATED[weekday].to_string(),
        ('E', 4) => WEEKDAYS_WIDE[weekday].to_string(),
        ('E', 5) => WEEKDAYS_NARROW[weekday].to_string(),

        ('H', 1) => date.hour().to_string(),
        ('H', 2) => format!("{:02}", date.hour()),
        ('h', 1) => date.hour12().1.to_string(),
        ('h', 2) => format!("{:02}", date.hour12().1),
        ('m', 1) => date.minute().to_string(),
        ('m', 2) => format!("{:02}", date.minute()),
        ('s', 1) => date.second().to_string(),
        ('s', 2) => format!("{:02}", date.second()),

        ('a', 1..=3) => {
            if date.hour12().0 {
                "PM".to_string()
            } else {
                "AM".to_string()
            }
        }

        _ => return Err(DateError::UnknownToken(ch.to_string().repeat(len))),
    };

    Ok(value)
}
