//! # Store Error Types
//!
//! Error types for persistence, authorization and engine operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  std::io::Error / serde_json::Error / toml errors                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds context and categorization            │
//! │       │                                                                 │
//! │       ├──► ProductionError::Store  (production runs)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Caller (screen, CLI) displays a message                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use papeleria_core::{CoreError, ValidationError};
use thiserror::Error;

/// Store operation errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity required by the operation does not exist.
    ///
    /// ## When This Occurs
    /// - Cancelling a sale id that is not in the journal
    /// - Setting the final price of an unknown SKU
    /// - Replaying a recipe that was never saved
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An entity with the same id already exists.
    ///
    /// ## When This Occurs
    /// - Checking out a sale whose id is already in the journal
    #[error("{entity} already exists: {id}")]
    Conflict { entity: String, id: String },

    /// Caller's role may not perform the action.
    ///
    /// ## When This Occurs
    /// - A seller cancels a sale
    /// - A seller clears the inventory
    #[error("Not authorized to {action}")]
    Unauthorized { action: String },

    /// Reading or writing a data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A data file holds JSON that does not match the record shape.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Input rejected before any state was touched.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Business rule violation from papeleria-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The TOML config file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The config could not be written as TOML.
    #[error("Config write error: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

impl StoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a given entity type and ID.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an Unauthorized error for an action.
    pub fn unauthorized(action: impl Into<String>) -> Self {
        StoreError::Unauthorized {
            action: action.into(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Production Error
// =============================================================================

/// Why a production run was rejected.
///
/// Every variant except `Store` is raised before any stock is touched.
#[derive(Debug, Error)]
pub enum ProductionError {
    /// Order shape is wrong (blank name, non-positive counts or quantities).
    #[error("Invalid production order: {0}")]
    Invalid(#[from] ValidationError),

    /// An input SKU is not in the inventory.
    #[error("Unknown input: {sku}")]
    UnknownInput { sku: String },

    /// An input does not have enough stock, compared in base units.
    #[error("Insufficient stock for {sku}: need {required_base:.2}, have {available_base:.2}")]
    InsufficientStock {
        sku: String,
        required_base: f64,
        available_base: f64,
    },

    /// Loading or persisting failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for production runs.
pub type ProductionResult<T> = Result<T, ProductionError>;
