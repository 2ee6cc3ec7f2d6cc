//! Transaction store - the persisted record set
//!
//! The full record set lives in memory and is written through to a single
//! storage key as a JSON array after every mutation. A mutation is only
//! applied in memory once the write succeeded, so a failed write leaves both
//! copies as they were.

use std::sync::Arc;

use serde::Serialize;

use super::logging::{LogEvent, LoggingService};
use crate::domain::result::{Error, Result};
use crate::domain::TransactionRecord;
use crate::ports::KeyValueStorage;

/// What `load` found in storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Nothing persisted yet
    Empty,
    Loaded { count: usize, dropped: usize },
    /// Persisted content was unreadable; the store starts empty
    Corrupt { reason: String },
}

pub struct TransactionStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    records: Vec<TransactionRecord>,
    logger: Option<Arc<LoggingService>>,
}

impl TransactionStore {
    /// Empty store bound to `key`; nothing is read until `load`
    pub fn new(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            records: Vec::new(),
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create a store and load whatever is persisted under `key`
    pub fn open(
        storage: Arc<dyn KeyValueStorage>,
        key: impl Into<String>,
        logger: Option<Arc<LoggingService>>,
    ) -> Self {
        let mut store = Self::new(storage, key);
        store.logger = logger;
        store.load();
        store
    }

    /// Replace the in-memory set with the persisted one
    ///
    /// Never fails: unreadable or malformed content is logged and the store
    /// is left empty. Persisted records violating the record invariants
    /// (non-positive amount, empty id) are dropped.
    pub fn load(&mut self) -> LoadOutcome {
        let content = match self.storage.read(&self.key) {
            Ok(Some(content)) => content,
            Ok(None) => {
                self.records.clear();
                self.log(LogEvent::new("store_loaded").with_count(0));
                return LoadOutcome::Empty;
            }
            Err(e) => return self.load_failed(e.to_string()),
        };

        let parsed: Vec<TransactionRecord> = match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => return self.load_failed(format!("Persisted records unreadable: {}", e)),
        };

        let total = parsed.len();
        self.records = parsed.into_iter().filter(|r| r.is_valid()).collect();
        let dropped = total - self.records.len();

        let mut event = LogEvent::new("store_loaded").with_count(self.records.len());
        if dropped > 0 {
            event = event.with_error(format!("Dropped {} invalid records", dropped));
        }
        self.log(event);

        LoadOutcome::Loaded {
            count: self.records.len(),
            dropped,
        }
    }

    fn load_failed(&mut self, reason: String) -> LoadOutcome {
        self.records.clear();
        self.log(
            LogEvent::new("store_load_failed")
                .with_operation("load")
                .with_error(reason.clone()),
        );
        LoadOutcome::Corrupt { reason }
    }

    /// Records in insertion order
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add a batch to the end of the set and persist
    ///
    /// Returns the number of records added. An empty batch is a no-op. A batch
    /// holding any invalid record is rejected whole.
    pub fn append(&mut self, batch: Vec<TransactionRecord>) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        check_records(&batch)?;

        let added = batch.len();
        let mut next = Vec::with_capacity(self.records.len() + added);
        next.extend_from_slice(&self.records);
        next.extend(batch);

        self.persist(&next)?;
        self.records = next;
        Ok(added)
    }

    /// Replace the whole set and persist
    pub fn replace_all(&mut self, records: Vec<TransactionRecord>) -> Result<()> {
        check_records(&records)?;
        self.persist(&records)?;
        self.records = records;
        Ok(())
    }

    /// Start a purge; nothing is deleted until the request is confirmed
    pub fn request_purge(&mut self) -> PurgeRequest<'_> {
        PurgeRequest { store: self }
    }

    /// Drops the storage key; the next load finds nothing
    fn clear(&mut self) -> Result<usize> {
        let removed = self.records.len();
        self.storage.remove(&self.key)?;
        self.records.clear();
        self.log(
            LogEvent::new("store_purged")
                .with_operation("clear")
                .with_count(removed),
        );
        Ok(removed)
    }

    fn persist(&self, records: &[TransactionRecord]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.storage.write(&self.key, &json)
    }

    /// Logging is best-effort
    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            let _ = logger.log(event);
        }
    }
}

fn check_records(records: &[TransactionRecord]) -> Result<()> {
    match records.iter().position(|r| !r.is_valid()) {
        Some(index) => Err(Error::validation(format!(
            "Record {} has an empty id or an amount outside (0, {}]",
            index,
            TransactionRecord::MAX_AMOUNT
        ))),
        None => Ok(()),
    }
}

/// A pending purge of every stored record
///
/// Dropping the request without confirming it leaves the store untouched.
#[must_use = "a purge request does nothing until confirmed"]
pub struct PurgeRequest<'a> {
    store: &'a mut TransactionStore,
}

impl PurgeRequest<'_> {
    /// Records that confirming would delete
    pub fn pending(&self) -> usize {
        self.store.len()
    }

    /// Delete every record and persist the empty set
    pub fn confirm(self) -> Result<usize> {
        self.store.clear()
    }

    pub fn cancel(self) {
        self.store
            .log(LogEvent::new("purge_cancelled").with_count(self.store.len()));
    }
}
