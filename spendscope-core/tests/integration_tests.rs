//! Integration tests for spendscope-core
//!
//! These tests drive the full import -> store -> views pipeline against a
//! real data directory (settings.json, the persisted record set and
//! logs.duckdb).
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tempfile::TempDir;

use spendscope_core::adapters::file::FileStorage;
use spendscope_core::adapters::memory::MemoryStorage;
use spendscope_core::config::Config;
use spendscope_core::domain::{Category, FieldMapping, Intensity};
use spendscope_core::ports::KeyValueStorage;
use spendscope_core::services::{
    category_comparison, intensity_heatmap, pace_of_spending, seasonality, LoadOutcome,
    SkipReason, TransactionStore,
};
use spendscope_core::{Error, SpendscopeContext};

// ============================================================================
// Test Helpers
// ============================================================================

const EXAMPLE_CSV: &str = "\
Date,Amount,Desc,Cat
2024-01-05,$50.00,Coffee,Dining
2024-01-05,abc,Bad,Other
";

const TWO_YEAR_CSV: &str = "\
Date,Amount,Description,Category,Notes
2023-01-01,1200.00,January rent,Rent,
2023-03-14,45.10,Market,Groceries,weekly
2023-12-31,99.99,NYE dinner,Dining,

2024-01-02,30.00,Market,Groceries,
2024-02-29,80.00,Leap day trip,Travel,
2024-12-31,20.00,NYE snacks,Groceries,
Total,,,,
";

fn example_mapping() -> FieldMapping {
    FieldMapping::new("Date", "Amount", "Desc", "Cat")
}

/// Open a context on a fresh data directory
fn open_context(temp_dir: &TempDir) -> SpendscopeContext {
    SpendscopeContext::new(temp_dir.path()).expect("Failed to open context")
}

/// Import a CSV with the suggested mapping, panicking on failure
fn import_with_suggestion(ctx: &mut SpendscopeContext, csv: &str) -> usize {
    let session = ctx.begin_import(csv.as_bytes()).unwrap();
    let mapping = session.suggested_mapping().cloned().unwrap();
    ctx.confirm_import(session, &mapping).unwrap().imported
}

fn d(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

// ============================================================================
// Import Pipeline Tests
// ============================================================================

/// The worked example: one good row, one row with a non-numeric amount
#[test]
fn test_example_import_stores_exactly_one_record() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);

    let session = ctx.begin_import(EXAMPLE_CSV.as_bytes()).unwrap();
    let summary = ctx.confirm_import(session, &example_mapping()).unwrap();

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.skipped_by_reason[&SkipReason::InvalidAmount], 1);

    let records = ctx.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].calendar_date(), NaiveDate::from_ymd_opt(2024, 1, 5));
    assert_eq!(records[0].description, "Coffee");
    assert_eq!(records[0].amount, d(5000));
    assert_eq!(records[0].category, Category::Dining);
    assert_eq!(records[0].account, "CSV Import");
}

#[test]
fn test_suggested_mapping_for_common_headers() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    let session = ctx.begin_import(TWO_YEAR_CSV.as_bytes()).unwrap();
    let mapping = session.suggested_mapping().unwrap();

    assert_eq!(mapping, &FieldMapping::new("Date", "Amount", "Description", "Category"));
    // The blank line is not a row; the totals row is, and is skipped later
    assert_eq!(session.row_count(), 7);
}

#[test]
fn test_parse_failure_is_distinct_from_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    let err = ctx.begin_import("".as_bytes()).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));

    let session = ctx.begin_import("Date,Amount\n".as_bytes()).unwrap();
    assert_eq!(session.row_count(), 0);
    assert!(ctx.records().is_empty());
}

#[test]
fn test_all_skipped_batch_leaves_store_unchanged() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);
    let before = ctx.records().to_vec();

    let csv = "Date,Amount\n2024-01-01,\n2024-01-02,n/a\n2024-01-03,$0.00\n";
    let session = ctx.begin_import(csv.as_bytes()).unwrap();
    let mapping = FieldMapping::new("Date", "Amount", "Date", "Date");
    let summary = ctx.confirm_import(session, &mapping).unwrap();

    assert_eq!(summary.imported, 0);
    assert_eq!(summary.skipped, 3);
    assert_eq!(ctx.records(), before.as_slice());
}

#[test]
fn test_cancelled_import_has_no_effect() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);

    let session = ctx.begin_import(TWO_YEAR_CSV.as_bytes()).unwrap();
    ctx.cancel_import(session);

    assert!(ctx.records().is_empty());
    assert!(ctx.years().is_empty());
}

#[test]
fn test_mapping_to_unknown_column_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);

    let session = ctx.begin_import(EXAMPLE_CSV.as_bytes()).unwrap();
    let mapping = FieldMapping::new("Date", "Value", "Desc", "Cat");

    assert!(ctx.preview_import(&session, &mapping).is_err());
    let err = ctx.confirm_import(session, &mapping).unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(ctx.records().is_empty());
}

#[test]
fn test_preview_does_not_store() {
    let temp_dir = TempDir::new().unwrap();
    let ctx = open_context(&temp_dir);

    let session = ctx.begin_import(EXAMPLE_CSV.as_bytes()).unwrap();
    let preview = ctx.preview_import(&session, &example_mapping()).unwrap();

    assert_eq!(preview.records.len(), 1);
    assert_eq!(preview.discovered, 2);
    assert!(ctx.records().is_empty());
}

#[test]
fn test_repeated_import_gets_fresh_ids() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);

    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

    let records = ctx.records();
    assert_eq!(records.len(), 12);

    let mut ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 12, "ids must stay unique across imports");

    // Identical rows normalize identically apart from the id
    assert_eq!(records[0].amount, records[6].amount);
    assert_eq!(records[0].date, records[6].date);
    assert_eq!(records[0].description, records[6].description);
}

#[test]
fn test_oversized_amounts_are_skipped_and_views_still_compute() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);

    let csv = "\
Date,Amount,Description,Category
2024-03-01,70000000000000000000000000000,Typo,Other
2024-03-02,70000000000000000000000000000,Typo,Other
2024-03-03,12.00,Lunch,Dining
";
    let session = ctx.begin_import(csv.as_bytes()).unwrap();
    let mapping = session.suggested_mapping().cloned().unwrap();
    let summary = ctx.confirm_import(session, &mapping).unwrap();

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.skipped_by_reason[&SkipReason::AmountTooLarge], 2);

    let views = ctx.views();
    assert_eq!(views.seasonality[0].month(3), d(1200));
    assert_eq!(ctx.status().total_amount, d(1200));
}

#[test]
fn test_unusual_date_formats_keep_their_rows() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut ctx = open_context(&temp_dir);
        let csv = "\
Date,Amount,Description,Category
2024.01.05,10.00,Dots,Other
20240105,20.00,Compact,Other
13/01/2024,5,Day first,Other
January 5 2024,7,Spelled out,Other
end of Q1,3,Free text,Other
";
        let session = ctx.begin_import(csv.as_bytes()).unwrap();
        let mapping = session.suggested_mapping().cloned().unwrap();
        let summary = ctx.confirm_import(session, &mapping).unwrap();
        assert_eq!(summary.imported, 5);
        assert_eq!(summary.skipped, 0);
    }

    // Everything survives a reload; only recognized dates reach the views
    let ctx = open_context(&temp_dir);
    assert_eq!(ctx.records().len(), 5);
    assert_eq!(ctx.records()[4].date.to_string(), "end of Q1");
    assert_eq!(ctx.years(), vec![2024]);
    assert_eq!(ctx.views().seasonality[0].month(1), d(4200));

    let status = ctx.status();
    assert_eq!(status.total_amount, d(4500));
    assert_eq!(status.undated, 1);
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[test]
fn test_reload_reproduces_records_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let expected = {
        let mut ctx = open_context(&temp_dir);
        import_with_suggestion(&mut ctx, TWO_YEAR_CSV);
        import_with_suggestion(&mut ctx, EXAMPLE_CSV);
        ctx.records().to_vec()
    };

    let ctx = open_context(&temp_dir);
    assert_eq!(ctx.records(), expected.as_slice());
}

#[test]
fn test_corrupt_persisted_state_starts_empty() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("transactions.json"), "{\"not\": \"an array\"}").unwrap();

    let ctx = open_context(&temp_dir);
    assert!(ctx.records().is_empty());

    // The failure is logged, not surfaced
    let logger = ctx.logging.as_ref().expect("logging enabled by default");
    let errors = logger.get_errors(10).unwrap();
    assert!(errors.iter().any(|e| e.event == "store_load_failed"));
}

#[test]
fn test_corrupt_state_is_replaced_by_next_import() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("transactions.json"), "garbage").unwrap();

    {
        let mut ctx = open_context(&temp_dir);
        import_with_suggestion(&mut ctx, TWO_YEAR_CSV);
    }

    let ctx = open_context(&temp_dir);
    assert_eq!(ctx.records().len(), 6);
}

#[test]
fn test_storage_key_from_settings() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("settings.json"),
        r#"{ "storage": { "key": "ledger" }, "logging": { "enabled": false } }"#,
    )
    .unwrap();

    let mut ctx = open_context(&temp_dir);
    assert!(ctx.logging.is_none());
    import_with_suggestion(&mut ctx, EXAMPLE_CSV);

    assert!(temp_dir.path().join("ledger.json").exists());
    assert!(!temp_dir.path().join("transactions.json").exists());
    assert!(!temp_dir.path().join("logs.duckdb").exists());
}

#[test]
fn test_store_over_file_storage_directly() {
    let temp_dir = TempDir::new().unwrap();
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(temp_dir.path()).unwrap());

    let mut store = TransactionStore::new(storage.clone(), "transactions");
    assert_eq!(store.load(), LoadOutcome::Empty);

    let mut ctx = SpendscopeContext::with_storage(
        Config::default(),
        temp_dir.path().to_path_buf(),
        storage,
        None,
    );
    import_with_suggestion(&mut ctx, EXAMPLE_CSV);

    assert_eq!(store.load(), LoadOutcome::Loaded { count: 1, dropped: 0 });
    assert_eq!(store.records(), ctx.records());
}

// ============================================================================
// Purge Tests
// ============================================================================

#[test]
fn test_purge_requires_confirmation_and_persists() {
    let temp_dir = TempDir::new().unwrap();
    {
        let mut ctx = open_context(&temp_dir);
        import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

        ctx.request_purge().cancel();
        assert_eq!(ctx.records().len(), 6);

        let removed = ctx.request_purge().confirm().unwrap();
        assert_eq!(removed, 6);
        assert!(ctx.records().is_empty());
    }

    let ctx = open_context(&temp_dir);
    assert!(ctx.records().is_empty());
}

#[test]
fn test_purge_empty_store_is_noop() {
    let storage = Arc::new(MemoryStorage::new());
    let mut ctx = SpendscopeContext::with_storage(
        Config::default(),
        std::env::temp_dir(),
        storage,
        None,
    );

    assert_eq!(ctx.request_purge().confirm().unwrap(), 0);
    assert!(ctx.records().is_empty());
}

// ============================================================================
// View Tests
// ============================================================================

#[test]
fn test_years_newest_first() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

    assert_eq!(ctx.years(), vec![2024, 2023]);
}

#[test]
fn test_views_cross_check() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

    let years = ctx.years();
    let records = ctx.records();
    let season = seasonality(records, &years);
    let heatmap = intensity_heatmap(records, &years);
    let pace = pace_of_spending(records, &years);

    for months in &season {
        for month in 1..=12 {
            assert_eq!(heatmap.cell(months.year, month).unwrap().total, months.month(month));
        }
    }

    for series in &pace {
        let year_total: Decimal = records
            .iter()
            .filter(|r| r.year() == Some(series.year))
            .map(|r| r.amount)
            .sum();
        assert_eq!(series.final_total(), year_total);
    }

    // 2024-12-31 is day 366 and only the closing sample sees it
    let pace_2024 = pace.iter().find(|p| p.year == 2024).unwrap();
    let day_365 = pace_2024.points.iter().find(|p| p.day == 365).unwrap();
    assert_eq!(day_365.cumulative, d(11000));
    assert_eq!(pace_2024.final_total(), d(13000));

    assert_eq!(heatmap.max, d(120000));
    assert_eq!(heatmap.cell(2023, 1).unwrap().intensity, Intensity::Peak);
}

#[test]
fn test_category_kept_when_only_older_year_has_spending() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

    let rows = category_comparison(ctx.records(), &ctx.years());
    let rent = rows.iter().find(|r| r.category == Category::Rent).unwrap();
    assert_eq!(rent.total_for(2023), d(120000));
    assert_eq!(rent.total_for(2024), Decimal::ZERO);

    // Sorted by 2024: Travel 80, Groceries 50, then the zero-in-2024 rows
    assert_eq!(rows[0].category, Category::Travel);
    assert_eq!(rows[1].category, Category::Groceries);
    assert_eq!(rows.len(), 4);
}

#[test]
fn test_status_and_all_views() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);

    let status = ctx.status();
    assert_eq!(status.total_transactions, 6);
    assert_eq!(status.total_amount, d(147509));
    assert_eq!(status.date_range.earliest.as_deref(), Some("2023-01-01"));

    let views = ctx.views_for(&[2024]);
    assert_eq!(views.years, vec![2024]);
    assert_eq!(views.seasonality[0].month(2), d(8000));
    let dist = views.distribution[0].summary.unwrap();
    assert_eq!(dist.count, 3);
    assert_eq!(dist.min, d(2000));
    assert_eq!(dist.median, d(3000));
    assert_eq!(dist.max, d(8000));

    let all = ctx.views();
    assert_eq!(all.years, vec![2024, 2023]);
    assert_eq!(all.categories.len(), 4);
}

// ============================================================================
// Logging Tests
// ============================================================================

#[test]
fn test_import_and_purge_are_logged_without_user_data() {
    let temp_dir = TempDir::new().unwrap();
    let mut ctx = open_context(&temp_dir);
    import_with_suggestion(&mut ctx, TWO_YEAR_CSV);
    ctx.request_purge().confirm().unwrap();
    let _ = ctx.begin_import("".as_bytes());

    let logger = ctx.logging.clone().unwrap();
    let entries = logger.get_recent(50).unwrap();
    let events: Vec<&str> = entries.iter().map(|e| e.event.as_str()).collect();

    assert!(events.contains(&"store_loaded"));
    assert!(events.contains(&"import_completed"));
    assert!(events.contains(&"store_purged"));
    assert!(events.contains(&"csv_parse_failed"));

    let import = entries.iter().find(|e| e.event == "import_completed").unwrap();
    assert_eq!(import.record_count, Some(6));

    for entry in &entries {
        let text = format!(
            "{:?} {:?} {:?}",
            entry.operation, entry.error_message, entry.error_details
        );
        assert!(!text.contains("January rent"));
        assert!(!text.contains("Groceries"));
    }
}
