//! # papeleria-store: Persistence and Engines for the Papelería Back Office
//!
//! Owns the data directory and every operation that changes it: the stock
//! ledger, the sale journal, recipes, production runs and checkout.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Back Office Data Flow                            │
//! │                                                                         │
//! │  Screen / CLI (checkout, produce, import)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  papeleria-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Engines     │    │  Repositories │    │  ChangeBus   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ Production    │───►│ StockLedger   │    │ INVENTORY_   │  │   │
//! │  │   │ Sales         │    │ SaleJournal   │    │ SALES_       │  │   │
//! │  │   │               │    │ RecipeStore   │    │ PRODUCTION_  │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────▲───────┘  │   │
//! │  │           │                    │                   │          │   │
//! │  │           └──────── Storage ◄──┘      publish after unlock    │   │
//! │  │                  (one write lock)                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  <data_dir>/products.json, sales.json, recipes.json, tickets/          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`storage`] - Data directory, JSON collections, write lock
//! - [`bus`] - Change notifications
//! - [`repository`] - Stock ledger, sale journal, recipe store
//! - [`engine`] - Production and sales engines
//! - [`config`] - `papeleria.toml` + environment overrides
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use papeleria_store::{Backoffice, EngineConfig};
//!
//! let office = Backoffice::open(EngineConfig::with_data_dir("./data")).await?;
//!
//! let hits = office.ledger().search("cuaderno").await?;
//! let sale = office.sales().checkout_cart(&cart, Money::from_cents(10_000)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bus;
pub mod config;
pub mod engine;
pub mod error;
pub mod repository;
pub mod storage;

// =============================================================================
// Re-exports
// =============================================================================

pub use bus::{BusError, ChangeBus, ChangeEvent, Topic};
pub use config::EngineConfig;
pub use engine::production::{ProductionEngine, ProductionOutcome, RecipeReplay};
pub use engine::sales::SalesEngine;
pub use error::{ProductionError, ProductionResult, StoreError, StoreResult};
pub use repository::ledger::StockLedger;
pub use repository::recipe::RecipeStore;
pub use repository::sale::SaleJournal;
pub use storage::{Storage, StorageConfig};

use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use papeleria_core::import::{products_from_rows, rows_from_delimited};
use papeleria_core::Session;

/// Log filter used when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,papeleria=debug";

/// Installs the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to [`DEFAULT_LOG_FILTER`]. Calling it a
/// second time is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Optional screens the host application may offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub users_management: bool,
}

/// Every component wired to one data directory and one bus.
#[derive(Debug, Clone)]
pub struct Backoffice {
    config: EngineConfig,
    storage: Arc<Storage>,
    bus: Arc<ChangeBus>,
    ledger: StockLedger,
    production: ProductionEngine,
    sales: SalesEngine,
}

impl Backoffice {
    /// Validates `config`, opens the data directory and builds the engines.
    pub async fn open(config: EngineConfig) -> StoreResult<Self> {
        config.validate()?;
        let storage = Arc::new(Storage::open(config.storage_config()).await?);
        let bus = Arc::new(ChangeBus::new());

        let ledger = StockLedger::new(Arc::clone(&storage), Arc::clone(&bus));
        let production = ProductionEngine::new(
            Arc::clone(&storage),
            Arc::clone(&bus),
            config.production.clone(),
        );
        let sales = SalesEngine::new(Arc::clone(&storage), Arc::clone(&bus), config.sales.clone());

        info!(
            store = %config.store.name,
            data_dir = %storage.data_dir().display(),
            "Back office ready"
        );

        Ok(Backoffice {
            config,
            storage,
            bus,
            ledger,
            production,
            sales,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn bus(&self) -> &Arc<ChangeBus> {
        &self.bus
    }

    pub fn ledger(&self) -> &StockLedger {
        &self.ledger
    }

    pub fn journal(&self) -> &SaleJournal {
        self.sales.journal()
    }

    pub fn recipes(&self) -> &RecipeStore {
        self.production.recipes()
    }

    pub fn production(&self) -> &ProductionEngine {
        &self.production
    }

    pub fn sales(&self) -> &SalesEngine {
        &self.sales
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            users_management: self.config.features.users_management,
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub async fn session(&self) -> StoreResult<Session> {
        self.storage.load_session().await
    }

    pub async fn save_session(&self, session: &Session) -> StoreResult<()> {
        info!(username = %session.username, role = %session.role(), "Session started");
        self.storage.save_session(session).await
    }

    pub async fn clear_session(&self) -> StoreResult<()> {
        self.storage.save_session(&Session::default()).await
    }

    // =========================================================================
    // Import
    // =========================================================================

    /// Imports a delimited text export (header row first) into the ledger.
    ///
    /// ## Returns
    /// Number of rows applied. Rows with a blank SKU are dropped; when a
    /// SKU repeats the later row wins.
    pub async fn import_delimited(&self, text: &str, delimiter: char) -> StoreResult<usize> {
        let products = products_from_rows(rows_from_delimited(text, delimiter));
        self.ledger.import_bulk(products).await
    }
}
