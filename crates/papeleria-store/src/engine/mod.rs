//! # Engine Module
//!
//! Multi-file operations that must commit as one unit.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Engines                                              │
//! │                                                                         │
//! │  ProductionEngine                                                      │
//! │  ├── produce            validate all inputs, then consume + add output │
//! │  ├── apply_final_price  set the price of the produced product          │
//! │  └── save_recipe / order_from_recipe                                   │
//! │                                                                         │
//! │  SalesEngine                                                           │
//! │  ├── checkout / checkout_cart   deduct stock, journal, receipt         │
//! │  ├── cancel_sale                admin only, full reversal              │
//! │  └── validate_stock / summary                                          │
//! │                                                                         │
//! │  Both take the storage write lock for the whole commit and publish     │
//! │  on the ChangeBus only after it is released.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod production;
pub mod sales;
