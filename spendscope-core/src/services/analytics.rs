//! Analytics - year-over-year views for the dashboard
//!
//! Every function here is a pure function of `(records, years)`. Nothing is
//! cached; callers recompute on each render from the store's current snapshot.
//! Records whose date was not recognized belong to no year and are left out.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::aggregate::round_money;
use crate::domain::{
    Category, CategoryComparison, FiveNumberSummary, Heatmap, HeatmapCell, HeatmapRow, Intensity,
    MonthlyTotals, PacePoint, PaceSeries, TransactionRecord, YearDistribution, YearTotal,
};

/// Distance between sampled days on the pace curve
pub const PACE_SAMPLE_STEP: usize = 5;

/// Day indices 0..=366, January 1 = 1
const DAYS_IN_INDEX: usize = 367;

/// Last regular sample; day 366 is appended as a closing sample
const LAST_REGULAR_SAMPLE: usize = 365;

/// Distinct calendar years in the record set, newest first
pub fn distinct_years(records: &[TransactionRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = records.iter().filter_map(|r| r.year()).collect();
    years.into_iter().rev().collect()
}

/// Records dated within `years`, paired with their date
fn dated_in<'a>(
    records: &'a [TransactionRecord],
    years: &'a [i32],
) -> impl Iterator<Item = (NaiveDate, &'a TransactionRecord)> + 'a {
    records
        .iter()
        .filter_map(|r| r.calendar_date().map(|date| (date, r)))
        .filter(move |(date, _)| years.contains(&date.year()))
}

/// Unrounded month sums per selected year
fn monthly_sums(records: &[TransactionRecord], years: &[i32]) -> HashMap<i32, [Decimal; 12]> {
    let mut sums: HashMap<i32, [Decimal; 12]> = years
        .iter()
        .map(|y| (*y, [Decimal::ZERO; 12]))
        .collect();

    for (date, record) in dated_in(records, years) {
        if let Some(months) = sums.get_mut(&date.year()) {
            months[date.month0() as usize] += record.amount;
        }
    }

    sums
}

/// Total per (year, calendar month), rounded to cents
///
/// One entry per selected year, in the order given.
pub fn seasonality(records: &[TransactionRecord], years: &[i32]) -> Vec<MonthlyTotals> {
    let sums = monthly_sums(records, years);

    years
        .iter()
        .map(|year| {
            let raw = sums.get(year).copied().unwrap_or([Decimal::ZERO; 12]);
            MonthlyTotals {
                year: *year,
                months: raw.map(round_money),
            }
        })
        .collect()
}

/// Cumulative spending by day of year, sampled every five days
///
/// Each series has samples at days 0, 5, ..., 365 plus a closing sample at
/// day 366, so its last value is the year's total even in leap years.
pub fn pace_of_spending(records: &[TransactionRecord], years: &[i32]) -> Vec<PaceSeries> {
    let mut daily: HashMap<i32, Vec<Decimal>> = years
        .iter()
        .map(|y| (*y, vec![Decimal::ZERO; DAYS_IN_INDEX]))
        .collect();

    for (date, record) in dated_in(records, years) {
        if let Some(days) = daily.get_mut(&date.year()) {
            days[date.ordinal() as usize] += record.amount;
        }
    }

    years
        .iter()
        .map(|year| {
            let days = daily
                .remove(year)
                .unwrap_or_else(|| vec![Decimal::ZERO; DAYS_IN_INDEX]);

            let mut cumulative = Vec::with_capacity(DAYS_IN_INDEX);
            let mut running = Decimal::ZERO;
            for total in days {
                running += total;
                cumulative.push(running);
            }

            let mut points: Vec<PacePoint> = (0..=LAST_REGULAR_SAMPLE)
                .step_by(PACE_SAMPLE_STEP)
                .chain(std::iter::once(DAYS_IN_INDEX - 1))
                .map(|day| PacePoint {
                    day: day as u32,
                    cumulative: round_money(cumulative[day]),
                })
                .collect();
            points.dedup_by_key(|p| p.day);

            PaceSeries {
                year: *year,
                points,
            }
        })
        .collect()
}

/// Total per category across the selected years
///
/// Categories with nothing spent in any selected year are left out. Rows are
/// ordered by the newest selected year's total, largest first, then by
/// category name.
pub fn category_comparison(
    records: &[TransactionRecord],
    years: &[i32],
) -> Vec<CategoryComparison> {
    let Some(newest) = years.iter().max().copied() else {
        return Vec::new();
    };

    let mut sums: HashMap<&Category, HashMap<i32, Decimal>> = HashMap::new();
    for (date, record) in dated_in(records, years) {
        *sums
            .entry(&record.category)
            .or_default()
            .entry(date.year())
            .or_insert(Decimal::ZERO) += record.amount;
    }

    let mut rows: Vec<CategoryComparison> = sums
        .into_iter()
        .map(|(category, by_year)| CategoryComparison {
            category: category.clone(),
            totals: years
                .iter()
                .map(|year| YearTotal {
                    year: *year,
                    total: round_money(by_year.get(year).copied().unwrap_or(Decimal::ZERO)),
                })
                .collect(),
        })
        .filter(|row| row.totals.iter().any(|t| !t.total.is_zero()))
        .collect();

    rows.sort_by(|a, b| {
        b.total_for(newest)
            .cmp(&a.total_for(newest))
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });

    rows
}

/// Seasonality grid with intensity tiers relative to the grid maximum
pub fn intensity_heatmap(records: &[TransactionRecord], years: &[i32]) -> Heatmap {
    let grid = seasonality(records, years);

    let max = grid
        .iter()
        .flat_map(|row| row.months.iter().copied())
        .max()
        .unwrap_or(Decimal::ZERO);

    let rows = grid
        .into_iter()
        .map(|row| HeatmapRow {
            year: row.year,
            cells: row
                .months
                .iter()
                .enumerate()
                .map(|(i, total)| HeatmapCell {
                    month: i as u32 + 1,
                    total: *total,
                    intensity: Intensity::classify(*total, max),
                })
                .collect(),
        })
        .collect();

    Heatmap { max, rows }
}

/// Five-number summary of individual transaction amounts per year
pub fn transaction_distribution(
    records: &[TransactionRecord],
    years: &[i32],
) -> Vec<YearDistribution> {
    years
        .iter()
        .map(|year| {
            let mut amounts: Vec<Decimal> = records
                .iter()
                .filter(|r| r.year() == Some(*year))
                .map(|r| r.amount)
                .collect();
            amounts.sort();

            YearDistribution {
                year: *year,
                summary: FiveNumberSummary::from_sorted(&amounts),
            }
        })
        .collect()
}

/// All dashboard views computed from one snapshot
#[derive(Debug, Clone, Serialize)]
pub struct DashboardViews {
    pub years: Vec<i32>,
    pub seasonality: Vec<MonthlyTotals>,
    pub pace: Vec<PaceSeries>,
    pub categories: Vec<CategoryComparison>,
    pub heatmap: Heatmap,
    pub distribution: Vec<YearDistribution>,
}

impl DashboardViews {
    /// Compute every view for `years`
    pub fn compute(records: &[TransactionRecord], years: &[i32]) -> Self {
        Self {
            years: years.to_vec(),
            seasonality: seasonality(records, years),
            pace: pace_of_spending(records, years),
            categories: category_comparison(records, years),
            heatmap: intensity_heatmap(records, years),
            distribution: transaction_distribution(records, years),
        }
    }

    /// Compute every view over all years present in `records`
    pub fn for_all_years(records: &[TransactionRecord]) -> Self {
        Self::compute(records, &distinct_years(records))
    }
}
