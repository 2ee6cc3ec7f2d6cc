//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "storage": { "key": "transactions" },
//!   "import": { "defaultDescription": "Imported transaction", "fallbackCategory": "Other", "accountTag": "CSV Import" },
//!   "logging": { "enabled": true }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    storage: StorageSettings,
    #[serde(default)]
    import: ImportDefaults,
    #[serde(default)]
    logging: LoggingSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageSettings {
    /// Key the record set is persisted under
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
        }
    }
}

fn default_storage_key() -> String {
    "transactions".to_string()
}

/// Values the normalizer falls back to for empty cells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportDefaults {
    pub default_description: String,
    pub fallback_category: String,
    /// Provenance tag stamped on every imported record
    pub account_tag: String,
}

impl Default for ImportDefaults {
    fn default() -> Self {
        Self {
            default_description: "Imported transaction".to_string(),
            fallback_category: "Other".to_string(),
            account_tag: "CSV Import".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Spendscope configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub storage: StorageSettings,
    pub import: ImportDefaults,
    pub logging: LoggingSettings,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing or malformed settings file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        Ok(Self {
            storage: raw.storage.clone(),
            import: raw.import.clone(),
            logging: raw.logging.clone(),
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving unmanaged keys
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.storage = self.storage.clone();
        settings.import = self.import.clone();
        settings.logging = self.logging.clone();

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)
            .with_context(|| format!("Failed to write {}", settings_path.display()))?;
        Ok(())
    }

    /// Per-user default data directory
    pub fn default_data_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("spendscope"))
    }
}
