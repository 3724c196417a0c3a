//! # Sales Summary
//!
//! Report figures computed from the sale journal.
//!
//! ```text
//! total            Σ sale totals (charged, cash-rounded)
//! transactions     number of sales
//! average_ticket   total / transactions (0 when there are none)
//! estimated_profit 40% of total (flat heuristic, no cost tracking)
//! top_products     SKUs ranked by quantity sold
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::money::Money;
use crate::types::Sale;

/// Share of revenue reported as profit.
pub const ESTIMATED_PROFIT_PERCENT: i64 = 40;

/// Quantity and revenue for one SKU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductTally {
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    #[ts(type = "number")]
    pub total: Money,
    pub transactions: usize,
    #[ts(type = "number")]
    pub average_ticket: Money,
    #[ts(type = "number")]
    pub estimated_profit: Money,
    pub top_products: Vec<ProductTally>,
}

impl SalesSummary {
    /// Summarizes `sales`, keeping the `top_n` best-selling SKUs.
    pub fn from_sales(sales: &[Sale], top_n: usize) -> Self {
        let total: Money = sales.iter().map(Sale::total).sum();
        let transactions = sales.len();
        let average_ticket = if transactions == 0 {
            Money::zero()
        } else {
            Money::from_cents(total.cents() / transactions as i64)
        };
        let estimated_profit =
            Money::from_cents((total.cents() * ESTIMATED_PROFIT_PERCENT + 50) / 100);

        let mut tallies: HashMap<String, ProductTally> = HashMap::new();
        for item in sales.iter().flat_map(|s| s.items()) {
            let entry = tallies
                .entry(item.sku.to_lowercase())
                .or_insert_with(|| ProductTally {
                    sku: item.sku.clone(),
                    name: item.name.clone(),
                    quantity: 0.0,
                    revenue: 0.0,
                });
            entry.quantity += item.quantity;
            entry.revenue += item.subtotal;
        }

        let mut top_products: Vec<ProductTally> = tallies.into_values().collect();
        top_products.sort_by(|a, b| {
            b.quantity
                .total_cmp(&a.quantity)
                .then_with(|| a.sku.cmp(&b.sku))
        });
        top_products.truncate(top_n);

        SalesSummary {
            total,
            transactions,
            average_ticket,
            estimated_profit,
            top_products,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;

    fn sale(id: &str, items: Vec<SaleItem>, total_cents: i64) -> Sale {
        let mut s = Sale::new(id);
        s.set_items(items);
        s.set_total(Money::from_cents(total_cents));
        s
    }

    #[test]
    fn test_empty_summary() {
        let summary = SalesSummary::from_sales(&[], 5);
        assert_eq!(summary.transactions, 0);
        assert!(summary.total.is_zero());
        assert!(summary.average_ticket.is_zero());
        assert!(summary.top_products.is_empty());
    }

    #[test]
    fn test_summary_figures() {
        let sales = vec![
            sale("a", vec![SaleItem::new("LAP-001", "Lápiz", 2.0, 3.5)], 700),
            sale(
                "b",
                vec![
                    SaleItem::new("lap-001", "Lápiz", 3.0, 3.5),
                    SaleItem::new("GOM-001", "Goma", 1.0, 5.0),
                ],
                1550,
            ),
        ];
        let summary = SalesSummary::from_sales(&sales, 1);
        assert_eq!(summary.total.cents(), 2250);
        assert_eq!(summary.transactions, 2);
        assert_eq!(summary.average_ticket.cents(), 1125);
        assert_eq!(summary.estimated_profit.cents(), 900);
        assert_eq!(summary.top_products.len(), 1);
        assert_eq!(summary.top_products[0].quantity, 5.0);
    }
}
