//! # Engine Configuration
//!
//! Settings for the back-office engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     PAPELERIA_DATA_DIR=/srv/papeleria                                  │
//! │     PAPELERIA_STORE_NAME="Papelería Centro"                            │
//! │     PAPELERIA_USERS_MANAGEMENT=true                                    │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/backoffice/papeleria.toml (Linux)                        │
//! │     ~/Library/Application Support/com.papeleria.backoffice/... (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # papeleria.toml
//! [storage]
//! data_dir = "/srv/papeleria/data"
//! pretty_json = true
//!
//! [store]
//! name = "Papelería Centro"
//!
//! [sales]
//! cash_step_cents = 50
//! top_products = 5
//!
//! [production]
//! margin_factor = 1.5
//! category = "Producción"
//!
//! [features]
//! users_management = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::storage::StorageConfig;
use papeleria_core::money::CASH_STEP_CENTS;

pub const CONFIG_FILE_NAME: &str = "papeleria.toml";

// =============================================================================
// Storage Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Directory holding the JSON collections and receipts.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_true")]
    pub pretty_json: bool,
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "papeleria", "backoffice")
        .map(|dirs| dirs.data_dir().join("data"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_true() -> bool {
    true
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            data_dir: default_data_dir(),
            pretty_json: true,
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Shop name shown on screens and reports.
    #[serde(default = "default_store_name")]
    pub name: String,
}

fn default_store_name() -> String {
    "Papelería".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            name: default_store_name(),
        }
    }
}

// =============================================================================
// Sales Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSettings {
    /// Cash rounding step in cents. Totals round to the nearest multiple.
    #[serde(default = "default_cash_step")]
    pub cash_step_cents: i64,

    /// Best sellers listed in the sales summary.
    #[serde(default = "default_top_products")]
    pub top_products: usize,
}

fn default_cash_step() -> i64 {
    CASH_STEP_CENTS
}

fn default_top_products() -> usize {
    5
}

impl Default for SalesSettings {
    fn default() -> Self {
        SalesSettings {
            cash_step_cents: default_cash_step(),
            top_products: default_top_products(),
        }
    }
}

// =============================================================================
// Production Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionSettings {
    /// Multiplier applied to unit cost for the suggested price.
    #[serde(default = "default_margin_factor")]
    pub margin_factor: f64,

    /// Category given to products created by a production run.
    #[serde(default = "default_production_category")]
    pub category: String,
}

fn default_margin_factor() -> f64 {
    1.5
}

fn default_production_category() -> String {
    "Producción".to_string()
}

impl Default for ProductionSettings {
    fn default() -> Self {
        ProductionSettings {
            margin_factor: default_margin_factor(),
            category: default_production_category(),
        }
    }
}

// =============================================================================
// Feature Flags
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeatureSettings {
    /// Whether the user-management screen is offered.
    #[serde(default)]
    pub users_management: bool,
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub sales: SalesSettings,

    #[serde(default)]
    pub production: ProductionSettings,

    #[serde(default)]
    pub features: FeatureSettings,
}

impl EngineConfig {
    /// Default configuration rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.into();
        config
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (papeleria.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Config("storage.data_dir must not be empty".into()));
        }

        if self.sales.cash_step_cents <= 0 {
            return Err(StoreError::Config(
                "sales.cash_step_cents must be greater than 0".into(),
            ));
        }

        let factor = self.production.margin_factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(StoreError::Config(format!(
                "production.margin_factor must be positive, got: {}",
                factor
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("PAPELERIA_DATA_DIR") {
            debug!(data_dir = %dir, "Overriding data directory from environment");
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(name) = lookup("PAPELERIA_STORE_NAME") {
            self.store.name = name;
        }

        if let Some(flag) = lookup("PAPELERIA_USERS_MANAGEMENT") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.features.users_management = true,
                "0" | "false" | "no" | "off" => self.features.users_management = false,
                _ => warn!(value = %flag, "Unknown PAPELERIA_USERS_MANAGEMENT value"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "papeleria", "backoffice")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Storage settings as a [`StorageConfig`].
    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new(self.storage.data_dir.clone()).pretty_json(self.storage.pretty_json)
    }
}
