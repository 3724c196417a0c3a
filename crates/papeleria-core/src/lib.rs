//! # papeleria-core: Pure Business Logic for the Papelería Back-Office
//!
//! Everything the back-office decides without touching disk: unit
//! conversion, pricing, cart arithmetic, recipe math, SKU generation and
//! receipt text.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Papelería Back-Office                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                papeleria-store (I/O Layer)                      │   │
//! │  │   StockLedger • SaleJournal • RecipeStore • ChangeBus           │   │
//! │  │   ProductionEngine • SalesEngine • EngineConfig                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ papeleria-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   units   │  │   cart    │  │  recipe   │  │   │
//! │  │   │  Product  │  │ UnitKind  │  │   Cart    │  │  Recipe   │  │   │
//! │  │   │   Sale    │  │ Presenta- │  │ CartLine  │  │ Production│  │   │
//! │  │   │   Role    │  │   tion    │  │           │  │   Order   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │    sku    │  │  receipt  │  │  summary  │  │   │
//! │  │   │   Money   │  │ generate  │  │  render   │  │   Sales   │  │   │
//! │  │   │cash_round │  │           │  │           │  │  Summary  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO FILES • NO LOCKS • NO EVENTS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Product, Sale, SaleItem, Role, Session
//! - [`units`] - sale unit ↔ base unit conversion and presentations
//! - [`money`] - cent-based Money and cash rounding
//! - [`cart`] - counter basket
//! - [`recipe`] - recipes, production orders, pricing
//! - [`sku`] - SKU generation
//! - [`import`] - spreadsheet rows to products
//! - [`receipt`] - receipt text
//! - [`summary`] - sales report figures
//! - [`error`] / [`validation`] - typed errors and input checks
//!
//! ## Example Usage
//!
//! ```rust
//! use papeleria_core::{Cart, Money, Presentation, Product};
//! use papeleria_core::money::CASH_STEP_CENTS;
//!
//! let ream = Product::new("PAP-001", "Hojas carta", "paquete")
//!     .with_content(500.0)
//!     .with_price(Money::from_cents(9500));
//!
//! let mut cart = Cart::new();
//! cart.add(&ream, Presentation::Sheet, 10.0).unwrap();
//!
//! // 10 sheets of a 95.00 ream = 1.90, charged as 2.00
//! assert_eq!(cart.charged_total(CASH_STEP_CENTS).cents(), 200);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod import;
pub mod money;
pub mod receipt;
pub mod recipe;
pub mod sku;
pub mod summary;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use recipe::{Pricing, ProductionInput, ProductionOrder, Recipe, RecipeItem};
pub use summary::{ProductTally, SalesSummary};
pub use types::*;
pub use units::{Presentation, UnitKind};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Length of a sale id (leading hex digits of a v4 UUID).
pub const SALE_ID_LEN: usize = 8;
