//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

pub mod aggregate;
mod date;
mod mapping;
pub mod result;
mod transaction;

pub use aggregate::{
    CategoryComparison, FiveNumberSummary, Heatmap, HeatmapCell, HeatmapRow, Intensity,
    MonthlyTotals, PacePoint, PaceSeries, YearDistribution, YearTotal,
};
pub use date::{parse_calendar_date, TransactionDate};
pub use mapping::{CanonicalField, FieldMapping};
pub use transaction::{Category, TransactionRecord};
