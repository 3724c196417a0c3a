//! # Sales Engine
//!
//! Charges sales, books them in the journal and reverses them on admin
//! request.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout(sale)                                       │
//! │                                                                         │
//! │  1. raw = Σ subtotals                                                  │
//! │  2. total = cash_round(raw)        0 → 0, 0.20 → 0.50, 7.10 → 7.00      │
//! │  3. reject: no items / qty ≤ 0 / cash < total / malformed id           │
//! │  4. stamp now, set total (change follows)                              │
//! │  ── lock ────────────────────────────────────────────────────────────  │
//! │  5. reject an id already in the journal                                │
//! │  6. write tickets/ticket-<id>.txt                                      │
//! │  7. stock −= quantity per line, append to sales.json                   │
//! │     (unknown SKUs skipped; receipt removed if this fails)              │
//! │  ── unlock ──────────────────────────────────────────────────────────  │
//! │  8. SALES_CHANGED, then INVENTORY_CHANGED                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bus::{ChangeBus, Topic};
use crate::config::SalesSettings;
use crate::error::{StoreError, StoreResult};
use crate::repository::ledger::{persist_sorted, position_of};
use crate::repository::sale::SaleJournal;
use crate::storage::{Storage, WriteGuard};
use papeleria_core::receipt::render_receipt;
use papeleria_core::validation::{validate_identifier, validate_quantity};
use papeleria_core::{Cart, CoreError, Money, Role, Sale, SalesSummary, SALE_ID_LEN};

const SALE_REASON: &str = "SALE";
const CANCEL_REASON: &str = "CANCEL";

/// Fresh sale id: the first hex digits of a v4 UUID.
pub fn new_sale_id() -> String {
    Uuid::new_v4().simple().to_string().chars().take(SALE_ID_LEN).collect()
}

/// Commits and reverses sales.
#[derive(Debug, Clone)]
pub struct SalesEngine {
    storage: Arc<Storage>,
    bus: Arc<ChangeBus>,
    journal: SaleJournal,
    settings: SalesSettings,
}

impl SalesEngine {
    pub fn new(storage: Arc<Storage>, bus: Arc<ChangeBus>, settings: SalesSettings) -> Self {
        let journal = SaleJournal::new(Arc::clone(&storage));
        SalesEngine {
            storage,
            bus,
            journal,
            settings,
        }
    }

    pub fn journal(&self) -> &SaleJournal {
        &self.journal
    }

    /// Charges `sale` and commits it.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The committed sale with its rounded total and change
    /// * `Err(StoreError::Core(EmptyCart))` - The sale has no items
    /// * `Err(StoreError::Core(InsufficientCash))` - Cash below the rounded total
    /// * `Err(StoreError::Validation)` - A non-positive quantity or a malformed id
    /// * `Err(StoreError::Conflict)` - The id is already in the journal
    ///
    /// Rejections happen before any file is touched. The receipt is written
    /// first and removed again if the stock or journal write fails.
    pub async fn checkout(&self, mut sale: Sale) -> StoreResult<Sale> {
        if sale.items().is_empty() {
            return Err(CoreError::EmptyCart.into());
        }
        for item in sale.items() {
            validate_quantity("quantity", item.quantity)?;
        }

        let total = Money::cash_round(sale.raw_total(), self.settings.cash_step_cents);
        if sale.cash_tendered() < total {
            warn!(total = %total, cash = %sale.cash_tendered(), "Checkout rejected: insufficient cash");
            return Err(CoreError::InsufficientCash {
                total: total.grouped(),
                tendered: sale.cash_tendered().grouped(),
            }
            .into());
        }

        sale.id = match sale.id.trim() {
            "" => new_sale_id(),
            id => id.to_string(),
        };
        validate_identifier("sale id", &sale.id)?;
        sale.timestamp = Local::now().naive_local();
        sale.set_total(total);

        let guard = self.storage.lock().await;
        if self.journal.find_sale(&sale.id).await?.is_some() {
            warn!(id = %sale.id, "Checkout rejected: duplicate sale id");
            return Err(StoreError::conflict("Sale", sale.id.as_str()));
        }

        let receipt = render_receipt(&sale, self.settings.cash_step_cents);
        self.storage.write_receipt(&sale.id, &receipt).await?;
        if let Err(e) = self.commit_sale(&guard, &sale).await {
            if let Err(cleanup) = self.storage.delete_receipt(&sale.id).await {
                warn!(id = %sale.id, error = %cleanup, "Could not remove receipt of failed sale");
            }
            return Err(e);
        }
        drop(guard);

        info!(id = %sale.id, total = %sale.total(), items = sale.items().len(), "Sale committed");
        self.bus.publish(Topic::SalesChanged, SALE_REASON);
        self.bus.publish(Topic::InventoryChanged, SALE_REASON);
        Ok(sale)
    }

    /// Deducts stock for every line and appends the sale to the journal.
    async fn commit_sale(&self, guard: &WriteGuard<'_>, sale: &Sale) -> StoreResult<()> {
        let mut products = self.storage.load_products().await?;
        for item in sale.items() {
            match position_of(&products, &item.sku) {
                Some(idx) => {
                    products[idx].adjust_stock(-item.quantity);
                    debug!(sku = %item.sku, quantity = item.quantity, "Stock deducted");
                }
                None => warn!(sku = %item.sku, sale = %sale.id, "Sold SKU not in inventory; stock untouched"),
            }
        }
        persist_sorted(&self.storage, guard, &mut products).await?;
        self.journal.append(guard, sale.clone()).await
    }

    /// Builds a sale from `cart` with a fresh id and commits it.
    pub async fn checkout_cart(&self, cart: &Cart, cash: Money) -> StoreResult<Sale> {
        let sale = cart.to_sale(new_sale_id(), cash, self.settings.cash_step_cents)?;
        self.checkout(sale).await
    }

    /// Reverses a committed sale: restores stock, removes it from the
    /// journal and deletes its receipt. Admin only.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The sale that was cancelled
    /// * `Err(StoreError::Unauthorized)` - `role` is not admin; nothing touched
    /// * `Err(StoreError::NotFound)` - No sale has that id
    pub async fn cancel_sale(&self, sale_id: &str, role: Role) -> StoreResult<Sale> {
        if !role.is_admin() {
            warn!(sale = %sale_id, role = %role, "Rejected sale cancellation");
            return Err(StoreError::unauthorized("cancel a sale"));
        }
        let sale_id = sale_id.trim();

        let guard = self.storage.lock().await;
        let sale = self
            .journal
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| StoreError::not_found("Sale", sale_id))?;

        let mut products = self.storage.load_products().await?;
        for item in sale.items() {
            if let Some(idx) = position_of(&products, &item.sku) {
                products[idx].adjust_stock(item.quantity);
            }
        }
        persist_sorted(&self.storage, &guard, &mut products).await?;
        self.journal.remove(&guard, sale_id).await?;
        self.storage.delete_receipt(sale_id).await?;
        drop(guard);

        info!(id = %sale_id, "Sale cancelled");
        self.bus.publish(Topic::SalesChanged, CANCEL_REASON);
        self.bus.publish(Topic::InventoryChanged, CANCEL_REASON);
        Ok(sale)
    }

    /// Whether `sku` has at least `required` in stock (sale units).
    /// An unknown SKU never has enough.
    pub async fn validate_stock(&self, sku: &str, required: f64) -> StoreResult<bool> {
        let products = self.storage.load_products().await?;
        Ok(position_of(&products, sku)
            .map(|idx| products[idx].stock >= required)
            .unwrap_or(false))
    }

    /// Report figures over the whole journal.
    pub async fn summary(&self) -> StoreResult<SalesSummary> {
        let sales = self.journal.list_sales().await?;
        Ok(SalesSummary::from_sales(&sales, self.settings.top_products))
    }

    /// Report figures for sales within `[from, to]`.
    pub async fn summary_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> StoreResult<SalesSummary> {
        let sales = self.journal.sales_between(from, to).await?;
        Ok(SalesSummary::from_sales(&sales, self.settings.top_products))
    }
}
