//! # Cart
//!
//! The counter-side basket a cashier fills before charging.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action            Cart Call               Line Change          │
//! │  ──────────────            ─────────               ───────────          │
//! │                                                                         │
//! │  Pick product + unit ────► add(p, presentation, q) ► push / merge       │
//! │                                                                         │
//! │  Click Remove ───────────► remove(index) ─────────► lines.remove(i)    │
//! │                                                                         │
//! │  Click Clear ────────────► clear() ───────────────► lines.clear()      │
//! │                                                                         │
//! │  Cobrar ─────────────────► to_sale(id, cash) ─────► Sale (validated)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every line stores its quantity in the product's sale unit. The
//! presentation the cashier typed is kept only for display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, Sale, SaleItem};
use crate::units::{self, Presentation};
use crate::validation::validate_quantity;
use crate::MAX_CART_LINES;

/// A line in the cart.
///
/// ## Price Freezing
/// Name and price are copied when the line is added; later edits to the
/// product do not change what this cart charges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub sku: String,
    pub name: String,

    /// Unit picked at the counter.
    pub presentation: Presentation,

    /// Quantity as typed, in `presentation` units.
    pub presentation_qty: f64,

    /// Quantity in the product's sale unit (what leaves stock).
    pub quantity: f64,

    /// Price of one sale unit at the time the line was added.
    pub unit_price: f64,
}

impl CartLine {
    pub fn subtotal(&self) -> f64 {
        self.quantity * self.unit_price
    }

    fn to_sale_item(&self) -> SaleItem {
        SaleItem::new(self.sku.clone(), self.name.clone(), self.quantity, self.unit_price)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines with the same SKU, presentation and unit price merge
/// - Every line has a positive quantity
/// - At most [`MAX_CART_LINES`] lines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Adds `qty` of `product` entered in `presentation`.
    ///
    /// ## Returns
    /// - `Ok(())` on success
    /// - `Err(CoreError::Validation)` if `qty` is not positive
    /// - `Err(CoreError::UnsupportedPresentation)` if the product cannot
    ///   be split that way
    /// - `Err(CoreError::CartTooLarge)` when a new line would exceed the limit
    pub fn add(&mut self, product: &Product, presentation: Presentation, qty: f64) -> CoreResult<()> {
        validate_quantity("quantity", qty)?;
        let quantity = units::to_sale_unit(product, presentation, qty)?;
        let unit_price = product.price.to_decimal();

        if let Some(line) = self.lines.iter_mut().find(|l| {
            l.sku == product.sku && l.presentation == presentation && l.unit_price == unit_price
        }) {
            line.presentation_qty += qty;
            line.quantity += quantity;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge { max: MAX_CART_LINES });
        }

        self.lines.push(CartLine {
            sku: product.sku.clone(),
            name: product.name.clone(),
            presentation,
            presentation_qty: qty,
            quantity,
            unit_price,
        });
        Ok(())
    }

    /// Removes the line at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<CartLine> {
        if index < self.lines.len() {
            Some(self.lines.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Σ line subtotals, unrounded.
    pub fn raw_total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// What the customer will be asked to pay.
    pub fn charged_total(&self, step_cents: i64) -> Money {
        Money::cash_round(self.raw_total(), step_cents)
    }

    /// Builds the sale to hand to the sales engine.
    ///
    /// ## Checks
    /// - cart must not be empty
    /// - `cash` must cover the charged (rounded) total
    pub fn to_sale(&self, id: impl Into<String>, cash: Money, step_cents: i64) -> CoreResult<Sale> {
        if self.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        let charged = self.charged_total(step_cents);
        if cash < charged {
            return Err(CoreError::InsufficientCash {
                total: charged.grouped(),
                tendered: cash.grouped(),
            });
        }

        let mut sale = Sale::new(id);
        sale.set_items(self.lines.iter().map(CartLine::to_sale_item).collect());
        sale.set_cash_tendered(cash);
        Ok(sale)
    }
}
