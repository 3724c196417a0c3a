//! # Repository Module
//!
//! File-backed repositories for the back-office collections.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Who Owns Which File                                  │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  backoffice.ledger().search("cuaderno")                        │
//! │       ▼                                                                 │
//! │  StockLedger ───────────► products.json                                │
//! │  ├── list / search / find_by_sku                                       │
//! │  └── upsert / remove_by_sku / adjust_stock / import_bulk / clear_all   │
//! │                                                                         │
//! │  SaleJournal ───────────► sales.json + tickets/                        │
//! │  └── list_sales / find_sale / sales_between / read_receipt             │
//! │                                                                         │
//! │  RecipeStore ───────────► recipes.json                                 │
//! │  └── list / get_by_name / upsert / remove_by_name                      │
//! │                                                                         │
//! │  All three share one Storage and therefore one write lock.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod ledger;
pub mod recipe;
pub mod sale;
