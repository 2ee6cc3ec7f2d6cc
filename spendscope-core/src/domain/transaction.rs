//! Transaction domain model

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::date::TransactionDate;

/// Spending category
///
/// The enumerated variants are the categories the dashboard knows about.
/// Anything else found in an imported file is kept verbatim as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Groceries,
    Rent,
    Utilities,
    Transportation,
    Entertainment,
    Healthcare,
    Shopping,
    Dining,
    Travel,
    Subscriptions,
    Income,
    Transfer,
    Other,
    Custom(String),
}

impl Category {
    /// All enumerated categories, in display order
    pub const KNOWN: [Category; 13] = [
        Category::Groceries,
        Category::Rent,
        Category::Utilities,
        Category::Transportation,
        Category::Entertainment,
        Category::Healthcare,
        Category::Shopping,
        Category::Dining,
        Category::Travel,
        Category::Subscriptions,
        Category::Income,
        Category::Transfer,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Groceries => "Groceries",
            Category::Rent => "Rent",
            Category::Utilities => "Utilities",
            Category::Transportation => "Transportation",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Dining => "Dining",
            Category::Travel => "Travel",
            Category::Subscriptions => "Subscriptions",
            Category::Income => "Income",
            Category::Transfer => "Transfer",
            Category::Other => "Other",
            Category::Custom(name) => name,
        }
    }

    /// True for free-text categories outside the enumeration
    pub fn is_custom(&self) -> bool {
        matches!(self, Category::Custom(_))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = std::convert::Infallible;

    /// Case-insensitive match against the enumeration, free text otherwise
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let known = Category::KNOWN
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .cloned();
        Ok(known.unwrap_or_else(|| Category::Custom(trimmed.to_string())))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(category) => category,
            Err(never) => match never {},
        }
    }
}

impl From<Category> for String {
    fn from(category: Category) -> Self {
        category.as_str().to_string()
    }
}

/// A normalized transaction as held by the store
///
/// Records are created once during import and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub date: TransactionDate,
    pub description: String,
    /// Always a positive magnitude, at most `MAX_AMOUNT`
    pub amount: Decimal,
    pub category: Category,
    /// Provenance tag
    pub account: String,
}

impl TransactionRecord {
    /// Largest amount a single record may carry (one trillion)
    ///
    /// Keeps every sum over the store far below `Decimal::MAX`.
    pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_1000, 0xE8, 0, false, 0);

    /// `None` when the imported date text was not recognized
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.calendar()
    }

    pub fn year(&self) -> Option<i32> {
        self.calendar_date().map(|d| d.year())
    }

    /// Calendar month, 1-12
    pub fn month(&self) -> Option<u32> {
        self.calendar_date().map(|d| d.month())
    }

    /// Day of year with January 1 = 1
    pub fn day_of_year(&self) -> Option<u32> {
        self.calendar_date().map(|d| d.ordinal())
    }

    /// Stored records carry a positive amount no larger than `MAX_AMOUNT`
    pub fn is_valid(&self) -> bool {
        self.amount > Decimal::ZERO && self.amount <= Self::MAX_AMOUNT && !self.id.is_empty()
    }
}
