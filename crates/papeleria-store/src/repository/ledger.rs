//! # Stock Ledger
//!
//! The authoritative product list.
//!
//! ## Write Cycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Every Ledger Write                                   │
//! │                                                                         │
//! │  lock() ──► load products.json ──► mutate in memory                    │
//! │                                         │                               │
//! │                                         ▼                               │
//! │            sort by (name, sku) ◄── case-insensitive                    │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │            persist full list ──► unlock ──► INVENTORY_CHANGED(reason)  │
//! │                                                                         │
//! │  Reasons: upsert:<sku>  delete:<sku>  clear  adjust:<sku>  bulk-import │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads never cache: `list()` goes to disk every time so every screen
//! sees the latest writes.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bus::{ChangeBus, Topic};
use crate::error::{StoreError, StoreResult};
use crate::storage::{Storage, WriteGuard};
use papeleria_core::sku;
use papeleria_core::{Product, Role};

/// Repository for the product list.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = backoffice.ledger();
///
/// ledger.upsert(Product::new("CU-001", "Cuaderno", "Unidad")).await?;
/// ledger.adjust_stock("cu-001", 12.0).await?;
///
/// let hits = ledger.search("cuader").await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockLedger {
    storage: Arc<Storage>,
    bus: Arc<ChangeBus>,
}

impl StockLedger {
    /// Creates a new StockLedger.
    pub fn new(storage: Arc<Storage>, bus: Arc<ChangeBus>) -> Self {
        StockLedger { storage, bus }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All products, as persisted.
    pub async fn list(&self) -> StoreResult<Vec<Product>> {
        self.storage.load_products().await
    }

    /// Case-insensitive substring search over SKU, name and category.
    ///
    /// ## Arguments
    /// * `query` - Search term; blank returns every product
    pub async fn search(&self, query: &str) -> StoreResult<Vec<Product>> {
        debug!(query = %query.trim(), "Searching products");
        let products = self.list().await?;
        let hits: Vec<Product> = products
            .into_iter()
            .filter(|p| p.matches_query(query))
            .collect();
        debug!(count = hits.len(), "Search returned products");
        Ok(hits)
    }

    /// Looks up a product by SKU (trimmed, case-insensitive).
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - No product has that SKU
    pub async fn find_by_sku(&self, sku: &str) -> StoreResult<Option<Product>> {
        let products = self.list().await?;
        Ok(position_of(&products, sku).map(|i| products[i].clone()))
    }

    /// Next free `<PREFIX>-NNN` SKU for a product called `name`.
    pub async fn generate_sku(&self, name: &str) -> StoreResult<String> {
        let products = self.list().await?;
        Ok(sku::generate_sku(name, products.iter().map(|p| p.sku.as_str())))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts or replaces a product by SKU.
    ///
    /// Negative content or stock is clamped to zero. A blank SKU is
    /// ignored.
    pub async fn upsert(&self, product: Product) -> StoreResult<()> {
        if product.sku.trim().is_empty() {
            debug!("Ignoring upsert with blank SKU");
            return Ok(());
        }
        let product = product.normalized();
        debug!(sku = %product.sku, "Upserting product");

        let guard = self.storage.lock().await;
        let mut products = self.storage.load_products().await?;
        let reason = format!("upsert:{}", product.sku);
        match position_of(&products, &product.sku) {
            Some(i) => {
                // the stored SKU spelling is kept
                let sku = std::mem::take(&mut products[i].sku);
                products[i] = Product { sku, ..product };
            }
            None => products.push(product),
        }
        self.commit(guard, products, reason).await
    }

    /// Removes every product with this SKU.
    ///
    /// ## Returns
    /// * `Ok(true)` - A product was removed
    /// * `Ok(false)` - Nothing matched (the list is still rewritten)
    pub async fn remove_by_sku(&self, sku: &str) -> StoreResult<bool> {
        if sku.trim().is_empty() {
            return Ok(false);
        }
        debug!(sku = %sku, "Removing product");

        let guard = self.storage.lock().await;
        let mut products = self.storage.load_products().await?;
        let before = products.len();
        products.retain(|p| !p.has_sku(sku));
        let removed = products.len() != before;

        self.commit(guard, products, format!("delete:{}", sku)).await?;
        Ok(removed)
    }

    /// Empties the inventory. Admin only.
    pub async fn clear_all(&self, role: Role) -> StoreResult<()> {
        if !role.is_admin() {
            warn!(role = %role, "Rejected inventory clear");
            return Err(StoreError::unauthorized("clear the inventory"));
        }
        info!("Clearing inventory");

        let guard = self.storage.lock().await;
        self.commit(guard, Vec::new(), "clear".to_string()).await
    }

    /// Adds `delta` (in the product's sale unit) to its stock, clamping at
    /// zero.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock was changed and persisted
    /// * `Ok(false)` - `delta` was zero or the SKU is unknown; nothing written
    pub async fn adjust_stock(&self, sku: &str, delta: f64) -> StoreResult<bool> {
        if sku.trim().is_empty() || delta == 0.0 || !delta.is_finite() {
            return Ok(false);
        }

        let guard = self.storage.lock().await;
        let mut products = self.storage.load_products().await?;
        let Some(i) = position_of(&products, sku) else {
            debug!(sku = %sku, "Adjust skipped: unknown SKU");
            return Ok(false);
        };

        products[i].adjust_stock(delta);
        debug!(sku = %sku, delta, stock = products[i].stock, "Adjusting stock");

        self.commit(guard, products, format!("adjust:{}", sku)).await?;
        Ok(true)
    }

    /// Merges `rows` into the inventory by SKU.
    ///
    /// Existing products with a matching SKU are overwritten in place;
    /// later rows win over earlier ones. One persist and one notification
    /// for the whole batch.
    ///
    /// ## Returns
    /// Number of rows applied (blank SKUs are skipped).
    pub async fn import_bulk(&self, rows: Vec<Product>) -> StoreResult<usize> {
        let guard = self.storage.lock().await;
        let products = self.storage.load_products().await?;

        let mut order: Vec<String> = Vec::with_capacity(products.len() + rows.len());
        let mut merged: HashMap<String, Product> = HashMap::new();
        for product in products {
            let key = sku_key(&product.sku);
            if merged.insert(key.clone(), product).is_none() {
                order.push(key);
            }
        }

        let mut applied = 0;
        for row in rows {
            if row.sku.trim().is_empty() {
                continue;
            }
            let key = sku_key(&row.sku);
            if merged.insert(key.clone(), row.normalized()).is_none() {
                order.push(key);
            }
            applied += 1;
        }

        let products: Vec<Product> = order
            .into_iter()
            .filter_map(|key| merged.remove(&key))
            .collect();

        info!(applied, total = products.len(), "Bulk import merged");
        self.commit(guard, products, "bulk-import".to_string())
            .await?;
        Ok(applied)
    }

    /// Sorts and persists `products` under `guard`, releases the lock,
    /// then publishes `INVENTORY_CHANGED`.
    async fn commit(&self, guard: WriteGuard<'_>, mut products: Vec<Product>, reason: String) -> StoreResult<()> {
        persist_sorted(&self.storage, &guard, &mut products).await?;
        drop(guard);
        self.bus.publish(Topic::InventoryChanged, reason);
        Ok(())
    }
}

// =============================================================================
// Snapshot Helpers
// =============================================================================
// Used by the engines that mutate a loaded snapshot while holding the lock.

fn sku_key(sku: &str) -> String {
    sku.trim().to_lowercase()
}

/// Index of the first product with `sku` (trimmed, case-insensitive).
pub(crate) fn position_of(products: &[Product], sku: &str) -> Option<usize> {
    if sku.trim().is_empty() {
        return None;
    }
    products.iter().position(|p| p.has_sku(sku))
}

/// Sorts by (name, SKU), case-insensitive.
pub(crate) fn sort_products(products: &mut [Product]) {
    products.sort_by_cached_key(Product::sort_key);
}

/// Sorts then writes the full product list.
pub(crate) async fn persist_sorted(
    storage: &Storage,
    guard: &WriteGuard<'_>,
    products: &mut [Product],
) -> StoreResult<()> {
    sort_products(products);
    storage.save_products(guard, products).await
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ChangeEvent;
    use crate::storage::StorageConfig;
    use papeleria_core::Money;
    use std::sync::mpsc::Receiver;
    use tempfile::TempDir;

    async fn ledger() -> (TempDir, StockLedger, Receiver<ChangeEvent>) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(StorageConfig::new(dir.path())).await.unwrap();
        let bus = Arc::new(ChangeBus::new());
        let rx = bus.subscribe_channel();
        (dir, StockLedger::new(Arc::new(storage), bus), rx)
    }

    fn reasons(rx: &Receiver<ChangeEvent>) -> Vec<String> {
        rx.try_iter().map(|e| e.reason).collect()
    }

    #[tokio::test]
    async fn test_upsert_then_find_case_insensitive() {
        let (_dir, ledger, rx) = ledger().await;
        ledger
            .upsert(Product::new("ABC-1", "Borrador", "Unidad"))
            .await
            .unwrap();

        let found = ledger.find_by_sku("abc-1").await.unwrap();
        assert_eq!(found.map(|p| p.name), Some("Borrador".to_string()));
        assert_eq!(reasons(&rx), vec!["upsert:ABC-1"]);
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_clamps() {
        let (_dir, ledger, _rx) = ledger().await;
        ledger
            .upsert(Product::new("ABC-1", "Borrador", "Unidad").with_stock(5.0))
            .await
            .unwrap();
        ledger
            .upsert(
                Product::new("abc-1", "Borrador blanco", "Unidad")
                    .with_stock(-3.0)
                    .with_content(-1.0)
                    .with_price(Money::from_cents(450)),
            )
            .await
            .unwrap();

        let all = ledger.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].sku, "ABC-1");
        assert_eq!(all[0].name, "Borrador blanco");
        assert_eq!(all[0].stock, 0.0);
        assert_eq!(all[0].content, 0.0);
    }

    #[tokio::test]
    async fn test_blank_sku_upsert_is_noop() {
        let (_dir, ledger, rx) = ledger().await;
        ledger.upsert(Product::new("  ", "Nada", "Unidad")).await.unwrap();
        assert!(ledger.list().await.unwrap().is_empty());
        assert!(reasons(&rx).is_empty());
    }

    #[tokio::test]
    async fn test_list_sorted_by_name_then_sku() {
        let (_dir, ledger, _rx) = ledger().await;
        ledger
            .import_bulk(vec![
                Product::new("Z-2", "goma", "Unidad"),
                Product::new("A-9", "Tijeras", "Unidad"),
                Product::new("Z-1", "Goma", "Unidad"),
            ])
            .await
            .unwrap();

        let skus: Vec<String> = ledger.list().await.unwrap().into_iter().map(|p| p.sku).collect();
        assert_eq!(skus, vec!["Z-1", "Z-2", "A-9"]);
    }

    #[tokio::test]
    async fn test_adjust_clamps_at_zero() {
        let (_dir, ledger, rx) = ledger().await;
        ledger
            .upsert(Product::new("LAP-001", "Lápiz", "Unidad").with_stock(3.0))
            .await
            .unwrap();
        let _ = reasons(&rx);

        assert!(ledger.adjust_stock("lap-001", -1e9).await.unwrap());
        assert_eq!(ledger.find_by_sku("LAP-001").await.unwrap().unwrap().stock, 0.0);
        assert_eq!(reasons(&rx), vec!["adjust:lap-001"]);
    }

    #[tokio::test]
    async fn test_adjust_noops() {
        let (_dir, ledger, rx) = ledger().await;
        ledger
            .upsert(Product::new("LAP-001", "Lápiz", "Unidad").with_stock(3.0))
            .await
            .unwrap();
        let _ = reasons(&rx);

        assert!(!ledger.adjust_stock("LAP-001", 0.0).await.unwrap());
        assert!(!ledger.adjust_stock("NOPE", 5.0).await.unwrap());
        assert!(reasons(&rx).is_empty());
    }

    #[tokio::test]
    async fn test_remove_and_search() {
        let (_dir, ledger, _rx) = ledger().await;
        ledger
            .import_bulk(vec![
                Product::new("CU-001", "Cuaderno", "Unidad").with_category("Libretas"),
                Product::new("PL-001", "Pluma azul", "Unidad"),
            ])
            .await
            .unwrap();

        assert_eq!(ledger.search("libre").await.unwrap().len(), 1);
        assert_eq!(ledger.search("").await.unwrap().len(), 2);

        assert!(ledger.remove_by_sku("cu-001").await.unwrap());
        assert!(!ledger.remove_by_sku("cu-001").await.unwrap());
        assert_eq!(ledger.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_requires_admin() {
        let (_dir, ledger, rx) = ledger().await;
        ledger.upsert(Product::new("A", "Goma", "Unidad")).await.unwrap();
        let _ = reasons(&rx);

        let err = ledger.clear_all(Role::Seller).await.unwrap_err();
        assert!(matches!(err, StoreError::Unauthorized { .. }));
        assert_eq!(ledger.list().await.unwrap().len(), 1);
        assert!(reasons(&rx).is_empty());

        ledger.clear_all(Role::Admin).await.unwrap();
        assert!(ledger.list().await.unwrap().is_empty());
        assert_eq!(reasons(&rx), vec!["clear"]);
    }

    #[tokio::test]
    async fn test_import_bulk_later_rows_win() {
        let (_dir, ledger, rx) = ledger().await;
        ledger
            .upsert(Product::new("CU-001", "Cuaderno viejo", "Unidad"))
            .await
            .unwrap();
        let _ = reasons(&rx);

        let applied = ledger
            .import_bulk(vec![
                Product::new("cu-001", "Cuaderno rayas", "Unidad"),
                Product::new("", "Sin código", "Unidad"),
                Product::new("CU-001", "Cuaderno cuadros", "Unidad").with_stock(-4.0),
            ])
            .await
            .unwrap();

        assert_eq!(applied, 2);
        let all = ledger.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Cuaderno cuadros");
        assert_eq!(all[0].stock, 0.0);
        assert_eq!(reasons(&rx), vec!["bulk-import"]);
    }

    #[tokio::test]
    async fn test_generate_sku_skips_taken() {
        let (_dir, ledger, _rx) = ledger().await;
        ledger
            .import_bulk(vec![
                Product::new("LL-001", "Llavero", "Unidad"),
                Product::new("LL-002", "Llavero azul", "Unidad"),
            ])
            .await
            .unwrap();
        assert_eq!(ledger.generate_sku("Llavero rojo").await.unwrap(), "LL-003");
    }
}
