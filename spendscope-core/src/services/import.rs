//! Import service - CSV transaction import
//!
//! Flow: `begin` parses the upload and suggests a mapping, the user edits and
//! confirms it, `confirm` normalizes every row and appends the surviving
//! records to the store in one write. `cancel` discards the session without
//! touching the store.

use std::collections::BTreeMap;
use std::io::Read;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use chrono::{Local, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;

use super::csv_parser::{parse_csv, ParsedCsv, RawRow};
use super::ids::generate_id;
use super::logging::{LogEvent, LoggingService};
use super::store::TransactionStore;
use crate::config::ImportDefaults;
use crate::domain::result::{Error, Result};
use crate::domain::{Category, FieldMapping, TransactionDate, TransactionRecord};

/// Why a row produced no record
///
/// Skips are expected (blank lines, totals rows) and never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    MissingAmount,
    InvalidAmount,
    ZeroAmount,
    /// Above `TransactionRecord::MAX_AMOUNT`
    AmountTooLarge,
}

/// Turns raw rows into transaction records
pub struct Normalizer {
    defaults: ImportDefaults,
    fallback_category: Category,
    today: NaiveDate,
}

impl Normalizer {
    /// `today` is used for rows with an empty date
    pub fn new(defaults: ImportDefaults, today: NaiveDate) -> Self {
        let fallback_category = defaults.fallback_category.parse().unwrap_or(Category::Other);
        Self {
            defaults,
            fallback_category,
            today,
        }
    }

    /// Normalize one row through a confirmed mapping
    pub fn normalize_row(
        &self,
        row: &RawRow,
        mapping: &FieldMapping,
        id: String,
    ) -> std::result::Result<TransactionRecord, SkipReason> {
        let amount = parse_amount(field(row, &mapping.amount))?;

        // Unrecognized date text is kept as-is rather than losing the row
        let date = match field(row, &mapping.date) {
            Some(raw) => TransactionDate::parse(raw),
            None => self.today.into(),
        };

        let description = field(row, &mapping.description)
            .map(str::to_string)
            .unwrap_or_else(|| self.defaults.default_description.clone());

        let category = field(row, &mapping.category)
            .map(|raw| Category::from(raw.to_string()))
            .unwrap_or_else(|| self.fallback_category.clone());

        Ok(TransactionRecord {
            id,
            date,
            description,
            amount,
            category,
            account: self.defaults.account_tag.clone(),
        })
    }

    /// Normalize every row of a parsed file
    ///
    /// Record ids are `<batch_id>-<row index>`.
    pub fn normalize_all(&self, rows: &[RawRow], mapping: &FieldMapping, batch_id: &str) -> NormalizedBatch {
        let mut batch = NormalizedBatch {
            discovered: rows.len(),
            ..Default::default()
        };

        for (index, row) in rows.iter().enumerate() {
            match self.normalize_row(row, mapping, format!("{}-{}", batch_id, index)) {
                Ok(record) => batch.records.push(record),
                Err(reason) => *batch.skipped_by_reason.entry(reason).or_insert(0) += 1,
            }
        }

        batch
    }
}

/// Records produced from one file plus skip accounting
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub records: Vec<TransactionRecord>,
    pub discovered: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
}

impl NormalizedBatch {
    pub fn skipped(&self) -> usize {
        self.skipped_by_reason.values().sum()
    }
}

/// Trimmed, non-empty cell for `header`
fn field<'a>(row: &'a RawRow, header: &str) -> Option<&'a str> {
    row.get(header)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn amount_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^-?(?:\d+(?:\.\d*)?|\.\d+)").expect("amount prefix pattern is valid")
    })
}

/// Parse an amount cell into a positive magnitude
///
/// Everything but digits, '.' and '-' is stripped, then the longest leading
/// number is read: "$1,234.50" -> 1234.50, "(12.00)" -> 12.00, "1.2.3" -> 1.2.
fn parse_amount(raw: Option<&str>) -> std::result::Result<Decimal, SkipReason> {
    let raw = raw.ok_or(SkipReason::MissingAmount)?;

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    let prefix = amount_prefix()
        .find(&cleaned)
        .ok_or(SkipReason::InvalidAmount)?
        .as_str();

    let mut number = prefix.trim_end_matches('.').to_string();
    if let Some(rest) = number.strip_prefix("-.") {
        number = format!("-0.{}", rest);
    } else if number.starts_with('.') {
        number.insert(0, '0');
    }

    let amount = Decimal::from_str(&number)
        .map_err(|_| SkipReason::InvalidAmount)?
        .abs();

    if amount.is_zero() {
        return Err(SkipReason::ZeroAmount);
    }
    if amount > TransactionRecord::MAX_AMOUNT {
        return Err(SkipReason::AmountTooLarge);
    }
    Ok(amount)
}

/// An upload waiting for its mapping to be confirmed
#[derive(Debug)]
pub struct ImportSession {
    parsed: ParsedCsv,
    suggested: Option<FieldMapping>,
}

impl ImportSession {
    pub fn new(parsed: ParsedCsv) -> Self {
        let suggested = parsed.suggested_mapping();
        Self { parsed, suggested }
    }

    pub fn headers(&self) -> &[String] {
        &self.parsed.headers
    }

    pub fn row_count(&self) -> usize {
        self.parsed.row_count()
    }

    /// Mapping pre-filled by the header heuristic, for the user to edit
    pub fn suggested_mapping(&self) -> Option<&FieldMapping> {
        self.suggested.as_ref()
    }

    /// Reject mappings that name headers absent from the file
    pub fn check_mapping(&self, mapping: &FieldMapping) -> Result<()> {
        let missing = mapping.missing_headers(&self.parsed.headers);
        if missing.is_empty() {
            return Ok(());
        }
        let details: Vec<String> = missing
            .iter()
            .map(|f| format!("{} -> '{}'", f, mapping.header_for(*f)))
            .collect();
        Err(Error::validation(format!(
            "Mapped column not found in file: {}",
            details.join(", ")
        )))
    }
}

/// What a confirmed import would store
#[derive(Debug, Serialize)]
pub struct ImportPreview {
    pub discovered: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
    pub records: Vec<TransactionRecord>,
}

#[derive(Debug, Serialize)]
pub struct ImportSummary {
    /// Prefix shared by every record id in this import
    pub batch_id: String,
    /// Data rows in the file
    pub discovered: usize,
    /// Records appended to the store
    pub imported: usize,
    pub skipped: usize,
    pub skipped_by_reason: BTreeMap<SkipReason, usize>,
}

/// Import service for CSV imports
pub struct ImportService {
    defaults: ImportDefaults,
    logger: Option<Arc<LoggingService>>,
    fixed_today: Option<NaiveDate>,
}

impl ImportService {
    pub fn new(defaults: ImportDefaults, logger: Option<Arc<LoggingService>>) -> Self {
        Self {
            defaults,
            logger,
            fixed_today: None,
        }
    }

    /// Use a fixed date for rows without one instead of the local date
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn normalizer(&self) -> Normalizer {
        let today = self
            .fixed_today
            .unwrap_or_else(|| Local::now().date_naive());
        Normalizer::new(self.defaults.clone(), today)
    }

    /// Parse an upload and open a mapping session
    ///
    /// A parse failure is returned as `Error::Parse` and no session exists.
    pub fn begin(&self, reader: impl Read) -> Result<ImportSession> {
        match parse_csv(reader) {
            Ok(parsed) => Ok(ImportSession::new(parsed)),
            Err(e) => {
                self.log(LogEvent::new("csv_parse_failed").with_error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Normalize with `mapping` without storing anything
    pub fn preview(&self, session: &ImportSession, mapping: &FieldMapping) -> Result<ImportPreview> {
        session.check_mapping(mapping)?;
        let batch = self.normalizer().normalize_all(&session.parsed.rows, mapping, "preview");
        Ok(ImportPreview {
            discovered: batch.discovered,
            skipped_by_reason: batch.skipped_by_reason,
            records: batch.records,
        })
    }

    /// Normalize with the confirmed mapping and append the batch to the store
    ///
    /// The whole batch is written at once; on any error the store is unchanged.
    pub fn confirm(
        &self,
        session: ImportSession,
        mapping: &FieldMapping,
        store: &mut TransactionStore,
    ) -> Result<ImportSummary> {
        session.check_mapping(mapping)?;

        let batch_id = generate_id().to_string();
        let batch = self
            .normalizer()
            .normalize_all(&session.parsed.rows, mapping, &batch_id);
        let skipped = batch.skipped();

        let imported = store.append(batch.records)?;

        self.log(
            LogEvent::new("import_completed")
                .with_operation("append")
                .with_count(imported),
        );

        Ok(ImportSummary {
            batch_id,
            discovered: batch.discovered,
            imported,
            skipped,
            skipped_by_reason: batch.skipped_by_reason,
        })
    }

    /// Dismiss the mapping dialog; the store is not touched
    pub fn cancel(&self, session: ImportSession) {
        self.log(
            LogEvent::new("import_cancelled").with_count(session.row_count()),
        );
    }

    /// Logging is best-effort
    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }
}
