//! Derived views over the record set
//!
//! These are never persisted. The analytics service recomputes them from the
//! full record set on every request.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::Category;

/// Round a money value to cents
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum of amounts per calendar month for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub year: i32,
    /// Index 0 = January
    pub months: [Decimal; 12],
}

impl MonthlyTotals {
    /// Total for a calendar month, 1-12
    pub fn month(&self, month: u32) -> Decimal {
        month
            .checked_sub(1)
            .and_then(|i| self.months.get(i as usize))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    pub fn total(&self) -> Decimal {
        self.months.iter().copied().sum()
    }
}

/// Running total at a sampled day of the year
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PacePoint {
    pub day: u32,
    pub cumulative: Decimal,
}

/// Cumulative spending curve for one year
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaceSeries {
    pub year: i32,
    pub points: Vec<PacePoint>,
}

impl PaceSeries {
    /// Cumulative value at the last sampled day
    pub fn final_total(&self) -> Decimal {
        self.points
            .last()
            .map(|p| p.cumulative)
            .unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearTotal {
    pub year: i32,
    pub total: Decimal,
}

/// One category's totals across the selected years
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryComparison {
    pub category: Category,
    /// Same order as the selected years
    pub totals: Vec<YearTotal>,
}

impl CategoryComparison {
    pub fn total_for(&self, year: i32) -> Decimal {
        self.totals
            .iter()
            .find(|t| t.year == year)
            .map(|t| t.total)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Intensity tier of a heatmap cell relative to the grid maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    None,
    Low,
    Medium,
    High,
    Peak,
}

impl Intensity {
    /// Bucket a cell by its ratio to the maximum: 0, <0.2, <0.4, <0.7, >=0.7
    pub fn classify(value: Decimal, max: Decimal) -> Self {
        if value <= Decimal::ZERO || max <= Decimal::ZERO {
            return Intensity::None;
        }
        let ratio = value / max;
        if ratio < Decimal::new(2, 1) {
            Intensity::Low
        } else if ratio < Decimal::new(4, 1) {
            Intensity::Medium
        } else if ratio < Decimal::new(7, 1) {
            Intensity::High
        } else {
            Intensity::Peak
        }
    }

    /// Tier number, 0-4
    pub fn tier(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// Calendar month, 1-12
    pub month: u32,
    pub total: Decimal,
    pub intensity: Intensity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub year: i32,
    pub cells: Vec<HeatmapCell>,
}

/// Year x month grid with intensity tiers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    /// Largest cell value across the whole grid
    pub max: Decimal,
    pub rows: Vec<HeatmapRow>,
}

impl Heatmap {
    pub fn cell(&self, year: i32, month: u32) -> Option<&HeatmapCell> {
        self.rows
            .iter()
            .find(|r| r.year == year)
            .and_then(|r| r.cells.iter().find(|c| c.month == month))
    }
}

/// Min, quartiles and max over per-transaction amounts
///
/// Quartiles are taken at floor-division indices of the ascending-sorted
/// amounts, without interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FiveNumberSummary {
    pub count: usize,
    pub min: Decimal,
    pub q1: Decimal,
    pub median: Decimal,
    pub q3: Decimal,
    pub max: Decimal,
}

impl FiveNumberSummary {
    /// Summary of `values`, which must already be sorted ascending
    pub fn from_sorted(values: &[Decimal]) -> Option<Self> {
        let n = values.len();
        let min = *values.first()?;
        let max = *values.last()?;
        Some(Self {
            count: n,
            min,
            q1: values[n / 4],
            median: values[n / 2],
            q3: values[3 * n / 4],
            max,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearDistribution {
    pub year: i32,
    /// `None` when the year has no transactions
    pub summary: Option<FiveNumberSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(12345, 3)), d(1235));
        assert_eq!(round_money(Decimal::new(-12345, 3)), d(-1235));
        assert_eq!(round_money(d(100)), d(100));
    }

    #[test]
    fn test_intensity_thresholds() {
        let max = d(10000);
        assert_eq!(Intensity::classify(Decimal::ZERO, max), Intensity::None);
        assert_eq!(Intensity::classify(d(1999), max), Intensity::Low);
        assert_eq!(Intensity::classify(d(2000), max), Intensity::Medium);
        assert_eq!(Intensity::classify(d(3999), max), Intensity::Medium);
        assert_eq!(Intensity::classify(d(4000), max), Intensity::High);
        assert_eq!(Intensity::classify(d(6999), max), Intensity::High);
        assert_eq!(Intensity::classify(d(7000), max), Intensity::Peak);
        assert_eq!(Intensity::classify(max, max), Intensity::Peak);
    }

    #[test]
    fn test_intensity_with_empty_grid() {
        assert_eq!(Intensity::classify(Decimal::ZERO, Decimal::ZERO), Intensity::None);
        assert_eq!(Intensity::Peak.tier(), 4);
        assert_eq!(Intensity::None.tier(), 0);
    }

    #[test]
    fn test_five_number_summary_indices() {
        let values: Vec<Decimal> = (1..=8).map(|v| Decimal::from(v)).collect();
        let s = FiveNumberSummary::from_sorted(&values).unwrap();
        assert_eq!(s.count, 8);
        assert_eq!(s.min, Decimal::from(1));
        // floor(8/4) = 2, floor(8/2) = 4, floor(24/4) = 6
        assert_eq!(s.q1, Decimal::from(3));
        assert_eq!(s.median, Decimal::from(5));
        assert_eq!(s.q3, Decimal::from(7));
        assert_eq!(s.max, Decimal::from(8));
    }

    #[test]
    fn test_five_number_summary_single_and_empty() {
        let s = FiveNumberSummary::from_sorted(&[d(4200)]).unwrap();
        assert_eq!(s.min, d(4200));
        assert_eq!(s.q1, d(4200));
        assert_eq!(s.median, d(4200));
        assert_eq!(s.q3, d(4200));

        assert!(FiveNumberSummary::from_sorted(&[]).is_none());
    }

    #[test]
    fn test_monthly_totals_lookup() {
        let mut months = [Decimal::ZERO; 12];
        months[0] = d(1000);
        months[11] = d(250);
        let totals = MonthlyTotals { year: 2024, months };
        assert_eq!(totals.month(1), d(1000));
        assert_eq!(totals.month(12), d(250));
        assert_eq!(totals.month(0), Decimal::ZERO);
        assert_eq!(totals.month(13), Decimal::ZERO);
        assert_eq!(totals.total(), d(1250));
    }
}
