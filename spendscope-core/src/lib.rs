//! Spendscope Core - transaction ingestion and year-over-year aggregation
//!
//! This crate implements the dashboard's core following hexagonal architecture:
//!
//! - **domain**: Core entities (TransactionRecord, FieldMapping, derived views)
//! - **ports**: Trait definitions for external dependencies (KeyValueStorage)
//! - **services**: CSV parsing, normalization, the persisted store, analytics
//! - **adapters**: Concrete storage (filesystem, in-memory)
//!
//! Rendering is not part of this crate. The presentation layer reads the
//! record set, the year list and the views, and hands back uploads, confirmed
//! mappings and purge/cancel decisions.

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use adapters::file::FileStorage;
use config::Config;
use ports::KeyValueStorage;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{Category, FieldMapping, TransactionRecord};

/// Main context for Spendscope operations
///
/// Owns the store and every service. The persisted record set is loaded once
/// during construction, before any view can be computed.
pub struct SpendscopeContext {
    pub config: Config,
    pub data_dir: PathBuf,
    pub logging: Option<Arc<LoggingService>>,
    pub store: TransactionStore,
    pub import_service: ImportService,
}

impl SpendscopeContext {
    /// Open the context backed by files in `data_dir`
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create {}", data_dir.display()))?;

        let config = Config::load(data_dir)?;
        let storage = Arc::new(FileStorage::new(data_dir)?);

        // Running without a log is preferable to not running at all
        let logging = if config.logging.enabled {
            LoggingService::new(data_dir, env!("CARGO_PKG_VERSION"))
                .ok()
                .map(Arc::new)
        } else {
            None
        };

        Ok(Self::with_storage(config, data_dir.to_path_buf(), storage, logging))
    }

    /// Assemble a context over an arbitrary storage backend
    pub fn with_storage(
        config: Config,
        data_dir: PathBuf,
        storage: Arc<dyn KeyValueStorage>,
        logging: Option<Arc<LoggingService>>,
    ) -> Self {
        let store = TransactionStore::open(storage, config.storage.key.clone(), logging.clone());
        let import_service = ImportService::new(config.import.clone(), logging.clone());

        Self {
            config,
            data_dir,
            logging,
            store,
            import_service,
        }
    }

    pub fn records(&self) -> &[domain::TransactionRecord] {
        self.store.records()
    }

    /// Distinct years across all records, newest first
    pub fn years(&self) -> Vec<i32> {
        distinct_years(self.store.records())
    }

    /// Every dashboard view over all years
    pub fn views(&self) -> DashboardViews {
        DashboardViews::for_all_years(self.store.records())
    }

    /// Every dashboard view over a chosen set of years
    pub fn views_for(&self, years: &[i32]) -> DashboardViews {
        DashboardViews::compute(self.store.records(), years)
    }

    pub fn status(&self) -> StatusSummary {
        summarize(self.store.records())
    }

    /// Parse an upload; `Error::Parse` keeps the user out of the mapping step
    pub fn begin_import(&self, reader: impl Read) -> domain::result::Result<ImportSession> {
        self.import_service.begin(reader)
    }

    pub fn preview_import(
        &self,
        session: &ImportSession,
        mapping: &FieldMapping,
    ) -> domain::result::Result<ImportPreview> {
        self.import_service.preview(session, mapping)
    }

    pub fn confirm_import(
        &mut self,
        session: ImportSession,
        mapping: &FieldMapping,
    ) -> domain::result::Result<ImportSummary> {
        self.import_service.confirm(session, mapping, &mut self.store)
    }

    pub fn cancel_import(&self, session: ImportSession) {
        self.import_service.cancel(session)
    }

    /// Start a purge of every record; must be confirmed to take effect
    pub fn request_purge(&mut self) -> PurgeRequest<'_> {
        self.store.request_purge()
    }
}
