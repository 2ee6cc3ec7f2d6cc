//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

pub mod analytics;
pub mod csv_parser;
pub(crate) mod ids;
pub mod import;
pub mod logging;
pub mod status;
pub mod store;

pub use analytics::{
    category_comparison, distinct_years, intensity_heatmap, pace_of_spending, seasonality,
    transaction_distribution, DashboardViews,
};
pub use csv_parser::{parse_csv, parse_csv_str, ParsedCsv, RawRow};
pub use import::{
    ImportPreview, ImportService, ImportSession, ImportSummary, NormalizedBatch, Normalizer,
    SkipReason,
};
pub use logging::{LogEntry, LogEvent, LoggingService};
pub use status::{summarize, DateRange, StatusSummary};
pub use store::{LoadOutcome, PurgeRequest, TransactionStore};
