//! # Sale Journal
//!
//! Committed sales (`sales.json`) and their receipts (`tickets/`).
//!
//! The journal is append-only from the counter's point of view; the only
//! removal path is an admin cancellation through the sales engine.

use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::debug;

use crate::error::StoreResult;
use crate::storage::{Storage, WriteGuard};
use papeleria_core::Sale;

/// Repository for sale records.
///
/// ## Usage
/// ```rust,ignore
/// let journal = backoffice.journal();
///
/// let today = journal.sales_between(start_of_day, now).await?;
/// let text = journal.read_receipt(&today[0].id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleJournal {
    storage: Arc<Storage>,
}

impl SaleJournal {
    /// Creates a new SaleJournal.
    pub fn new(storage: Arc<Storage>) -> Self {
        SaleJournal { storage }
    }

    /// All sales, newest first.
    pub async fn list_sales(&self) -> StoreResult<Vec<Sale>> {
        let mut sales = self.storage.load_sales().await?;
        sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(sales)
    }

    /// Gets a sale by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Sale))` - Sale found
    /// * `Ok(None)` - No sale with that id
    pub async fn find_sale(&self, id: &str) -> StoreResult<Option<Sale>> {
        let id = id.trim();
        let sales = self.storage.load_sales().await?;
        Ok(sales.into_iter().find(|s| s.id == id))
    }

    /// Sales stamped within `[from, to]`, newest first.
    pub async fn sales_between(&self, from: NaiveDateTime, to: NaiveDateTime) -> StoreResult<Vec<Sale>> {
        debug!(%from, %to, "Listing sales in range");
        let sales = self.list_sales().await?;
        Ok(sales
            .into_iter()
            .filter(|s| s.timestamp >= from && s.timestamp <= to)
            .collect())
    }

    /// Receipt text for a sale, if one was written.
    pub async fn read_receipt(&self, id: &str) -> StoreResult<Option<String>> {
        self.storage.read_receipt(id.trim()).await
    }

    // =========================================================================
    // Writes (called by the sales engine under the write lock)
    // =========================================================================

    /// Appends `sale` to the journal.
    pub(crate) async fn append(&self, guard: &WriteGuard<'_>, sale: Sale) -> StoreResult<()> {
        debug!(id = %sale.id, total = %sale.total(), "Appending sale");
        let mut sales = self.storage.load_sales().await?;
        sales.push(sale);
        self.storage.save_sales(guard, &sales).await
    }

    /// Removes the sale with `id`, returning it.
    pub(crate) async fn remove(&self, guard: &WriteGuard<'_>, id: &str) -> StoreResult<Option<Sale>> {
        let mut sales = self.storage.load_sales().await?;
        let Some(pos) = sales.iter().position(|s| s.id == id) else {
            return Ok(None);
        };
        let sale = sales.remove(pos);
        self.storage.save_sales(guard, &sales).await?;
        debug!(id = %id, "Removed sale from journal");
        Ok(Some(sale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageConfig;
    use chrono::NaiveDate;
    use papeleria_core::SaleItem;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn sale(id: &str, when: NaiveDateTime) -> Sale {
        let mut s = Sale::new(id);
        s.timestamp = when;
        s.add_item(SaleItem::new("LAP-001", "Lápiz", 1.0, 3.5));
        s
    }

    async fn journal() -> (TempDir, Arc<Storage>, SaleJournal) {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(StorageConfig::new(dir.path())).await.unwrap());
        let journal = SaleJournal::new(Arc::clone(&storage));
        (dir, storage, journal)
    }

    #[tokio::test]
    async fn test_append_list_find() {
        let (_dir, storage, journal) = journal().await;
        {
            let guard = storage.lock().await;
            journal.append(&guard, sale("aaaa0001", at(1, 9))).await.unwrap();
            journal.append(&guard, sale("aaaa0002", at(2, 9))).await.unwrap();
        }

        let ids: Vec<String> = journal.list_sales().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["aaaa0002", "aaaa0001"]);
        assert!(journal.find_sale(" aaaa0001 ").await.unwrap().is_some());
        assert!(journal.find_sale("zzzz9999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_sales_between_is_inclusive() {
        let (_dir, storage, journal) = journal().await;
        {
            let guard = storage.lock().await;
            for (id, day) in [("d1", 1), ("d2", 2), ("d3", 3)] {
                journal.append(&guard, sale(id, at(day, 12))).await.unwrap();
            }
        }

        let hits = journal.sales_between(at(2, 12), at(3, 12)).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_remove() {
        let (_dir, storage, journal) = journal().await;
        let guard = storage.lock().await;
        journal.append(&guard, sale("aaaa0001", at(1, 9))).await.unwrap();

        assert!(journal.remove(&guard, "aaaa0001").await.unwrap().is_some());
        assert!(journal.remove(&guard, "aaaa0001").await.unwrap().is_none());
        drop(guard);
        assert!(journal.list_sales().await.unwrap().is_empty());
    }
}
