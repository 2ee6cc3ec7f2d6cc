//! Transaction dates

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Formats tried in order; month-first wins over day-first when both fit
const DATE_FORMATS: [&str; 13] = [
    "%Y-%m-%d",
    // Two-digit years first: %Y would read "24" as year 24
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d.%m.%Y",
    "%Y.%m.%d",
    "%Y%m%d",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse date text, accepting the date part of ISO timestamps
///
/// `%B` also reads abbreviated month names, so "Jan 05, 2024" and
/// "January 5 2024" both parse.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            let (date, rest) = (raw.get(..10)?, raw.get(10..)?);
            if rest.starts_with('T') || rest.starts_with(' ') {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
            } else {
                None
            }
        })
}

/// Date of a transaction
///
/// Text in a known format becomes a calendar date and is stored as
/// `YYYY-MM-DD`. Anything else is kept verbatim: the record stays in the
/// store but belongs to no year, month or day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionDate {
    Calendar(NaiveDate),
    Unrecognized(String),
}

impl TransactionDate {
    pub fn parse(raw: &str) -> Self {
        match parse_calendar_date(raw) {
            Some(date) => Self::Calendar(date),
            None => Self::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn calendar(&self) -> Option<NaiveDate> {
        match self {
            Self::Calendar(date) => Some(*date),
            Self::Unrecognized(_) => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, Self::Calendar(_))
    }
}

impl From<NaiveDate> for TransactionDate {
    fn from(date: NaiveDate) -> Self {
        Self::Calendar(date)
    }
}

impl From<String> for TransactionDate {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<TransactionDate> for String {
    fn from(date: TransactionDate) -> Self {
        date.to_string()
    }
}

impl fmt::Display for TransactionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Calendar(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            Self::Unrecognized(raw) => f.write_str(raw),
        }
    }
}
