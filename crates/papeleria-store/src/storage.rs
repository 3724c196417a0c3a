//! # Storage
//!
//! The data directory, its JSON collections, the receipt folder and the
//! engine-wide write lock.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Data Directory                                     │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StorageConfig::new(dir) ← Configure location + formatting             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Storage::open(config).await ← Create missing files with defaults      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <data_dir>/                                                           │
//! │  ├── products.json     []                                              │
//! │  ├── sales.json        []                                              │
//! │  ├── recipes.json      []                                              │
//! │  ├── users.json        []                                              │
//! │  ├── session.json      {"username":"","role":""}                      │
//! │  └── tickets/                                                          │
//! │      └── ticket-<id>.txt                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Write Protocol
//! Every collection write is load-all → mutate → persist-all while holding
//! the [`WriteGuard`] returned by [`Storage::lock`]. The `save_*` methods
//! take the guard by reference so a write cannot happen outside it.
//! Files are replaced atomically (temp file + rename).

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::StoreResult;
use papeleria_core::receipt::receipt_file_name;
use papeleria_core::{Product, Recipe, Sale, Session};

pub const PRODUCTS_FILE: &str = "products.json";
pub const SALES_FILE: &str = "sales.json";
pub const RECIPES_FILE: &str = "recipes.json";
pub const USERS_FILE: &str = "users.json";
pub const SESSION_FILE: &str = "session.json";
pub const TICKETS_DIR: &str = "tickets";

const EMPTY_COLLECTION: &str = "[]";
const EMPTY_SESSION: &str = r#"{"username":"","role":""}"#;

/// Proof that the engine-wide write lock is held.
pub type WriteGuard<'a> = MutexGuard<'a, ()>;

// =============================================================================
// Configuration
// =============================================================================

/// Storage configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = StorageConfig::new("./data").pretty_json(false);
/// ```
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding every data file.
    pub data_dir: PathBuf,

    /// Whether collections are written indented.
    /// Default: true (the files are hand-inspected in the shop)
    pub pretty_json: bool,
}

impl StorageConfig {
    /// Creates a configuration rooted at `data_dir`.
    ///
    /// The directory is created on open if it doesn't exist.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StorageConfig {
            data_dir: data_dir.into(),
            pretty_json: true,
        }
    }

    /// Sets whether JSON is written indented.
    pub fn pretty_json(mut self, pretty: bool) -> Self {
        self.pretty_json = pretty;
        self
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Handle on the data directory.
///
/// One `Storage` is created at startup and shared (`Arc`) by every
/// component, so they all serialize on the same write lock.
#[derive(Debug)]
pub struct Storage {
    config: StorageConfig,
    write_lock: Mutex<()>,
}

impl Storage {
    /// Opens the data directory, creating it and any missing file.
    ///
    /// ## Returns
    /// * `Ok(Storage)` - Ready to use
    /// * `Err(StoreError::Io)` - Directory or a default file could not be created
    pub async fn open(config: StorageConfig) -> StoreResult<Self> {
        info!(path = %config.data_dir.display(), "Opening data directory");

        tokio::fs::create_dir_all(&config.data_dir).await?;
        tokio::fs::create_dir_all(config.data_dir.join(TICKETS_DIR)).await?;

        for (file, default) in [
            (PRODUCTS_FILE, EMPTY_COLLECTION),
            (SALES_FILE, EMPTY_COLLECTION),
            (RECIPES_FILE, EMPTY_COLLECTION),
            (USERS_FILE, EMPTY_COLLECTION),
            (SESSION_FILE, EMPTY_SESSION),
        ] {
            let path = config.data_dir.join(file);
            if !tokio::fs::try_exists(&path).await? {
                debug!(file = %file, "Creating default data file");
                tokio::fs::write(&path, default).await?;
            }
        }

        Ok(Storage {
            config,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    pub fn tickets_dir(&self) -> PathBuf {
        self.config.data_dir.join(TICKETS_DIR)
    }

    /// Acquires the engine-wide write lock.
    pub async fn lock(&self) -> WriteGuard<'_> {
        self.write_lock.lock().await
    }

    // =========================================================================
    // Collections
    // =========================================================================

    pub async fn load_products(&self) -> StoreResult<Vec<Product>> {
        self.load_collection(PRODUCTS_FILE).await
    }

    pub async fn save_products(&self, _guard: &WriteGuard<'_>, products: &[Product]) -> StoreResult<()> {
        self.save_collection(PRODUCTS_FILE, products).await
    }

    pub async fn load_sales(&self) -> StoreResult<Vec<Sale>> {
        self.load_collection(SALES_FILE).await
    }

    pub async fn save_sales(&self, _guard: &WriteGuard<'_>, sales: &[Sale]) -> StoreResult<()> {
        self.save_collection(SALES_FILE, sales).await
    }

    pub async fn load_recipes(&self) -> StoreResult<Vec<Recipe>> {
        self.load_collection(RECIPES_FILE).await
    }

    pub async fn save_recipes(&self, _guard: &WriteGuard<'_>, recipes: &[Recipe]) -> StoreResult<()> {
        self.save_collection(RECIPES_FILE, recipes).await
    }

    /// Reads a JSON array. A missing, blank or `null` file is empty.
    async fn load_collection<T: DeserializeOwned>(&self, file: &str) -> StoreResult<Vec<T>> {
        let path = self.config.data_dir.join(file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        let items: Option<Vec<T>> = serde_json::from_str(&text)?;
        let items = items.unwrap_or_default();

        debug!(file = %file, count = items.len(), "Loaded collection");
        Ok(items)
    }

    async fn save_collection<T: Serialize>(&self, file: &str, items: &[T]) -> StoreResult<()> {
        let bytes = if self.config.pretty_json {
            serde_json::to_vec_pretty(items)?
        } else {
            serde_json::to_vec(items)?
        };
        self.replace_file(&self.config.data_dir.join(file), &bytes).await?;

        debug!(file = %file, count = items.len(), "Persisted collection");
        Ok(())
    }

    /// Writes `bytes` next to `path` and renames over it.
    async fn replace_file(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// Loads the session record. A missing or blank file is logged out.
    pub async fn load_session(&self) -> StoreResult<Session> {
        let path = self.config.data_dir.join(SESSION_FILE);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => Ok(Session::default()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Session::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save_session(&self, session: &Session) -> StoreResult<()> {
        let bytes = serde_json::to_vec_pretty(session)?;
        self.replace_file(&self.config.data_dir.join(SESSION_FILE), &bytes)
            .await
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Writes (or overwrites) the receipt for `sale_id`.
    pub async fn write_receipt(&self, sale_id: &str, text: &str) -> StoreResult<PathBuf> {
        let path = self.tickets_dir().join(receipt_file_name(sale_id));
        tokio::fs::write(&path, text).await?;
        debug!(sale_id = %sale_id, path = %path.display(), "Receipt written");
        Ok(path)
    }

    /// Receipt text for `sale_id`, or `None` if no receipt exists.
    pub async fn read_receipt(&self, sale_id: &str) -> StoreResult<Option<String>> {
        let path = self.tickets_dir().join(receipt_file_name(sale_id));
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Deletes the receipt for `sale_id`.
    ///
    /// ## Returns
    /// * `Ok(true)` - A receipt was removed
    /// * `Ok(false)` - There was none
    pub async fn delete_receipt(&self, sale_id: &str) -> StoreResult<bool> {
        let path = self.tickets_dir().join(receipt_file_name(sale_id));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(sale_id = %sale_id, "Receipt deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
