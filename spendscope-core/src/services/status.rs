//! Status service - record set summary

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::Serialize;

use super::analytics::distinct_years;
use crate::domain::TransactionRecord;

/// Summarize the record set for the dashboard header
pub fn summarize(records: &[TransactionRecord]) -> StatusSummary {
    let categories: HashSet<_> = records.iter().map(|r| &r.category).collect();
    let dates = || records.iter().filter_map(|r| r.calendar_date());

    StatusSummary {
        total_transactions: records.len(),
        total_amount: records.iter().map(|r| r.amount).sum(),
        total_categories: categories.len(),
        years: distinct_years(records),
        date_range: DateRange {
            earliest: dates().min().map(|d| d.to_string()),
            latest: dates().max().map(|d| d.to_string()),
        },
        undated: records.iter().filter(|r| !r.date.is_recognized()).count(),
    }
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub total_transactions: usize,
    pub total_amount: Decimal,
    pub total_categories: usize,
    /// Newest first
    pub years: Vec<i32>,
    pub date_range: DateRange,
    /// Records whose date text was not recognized
    pub undated: usize,
}

#[derive(Debug, Serialize)]
pub struct DateRange {
    pub earliest: Option<String>,
    pub latest: Option<String>,
}
