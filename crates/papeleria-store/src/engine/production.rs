//! # Production Engine
//!
//! Manufactures finished products from inputs held in stock.
//!
//! ## Validate-Then-Commit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    produce(order)                                       │
//! │                                                                         │
//! │  order.validate()            blank name / counts ≤ 0 / qty ≤ 0 ──► Err │
//! │       │                                                                 │
//! │  lock() + load products      (held until persist)                      │
//! │       │                                                                 │
//! │  for each input SKU:                                                   │
//! │    required = to_base(p, Σ qty_per_unit × total_units)                 │
//! │    available = to_base(p, p.stock)                                     │
//! │    available + 1e-9 < required ──────────────────────────────► Err     │
//! │       │                                                                 │
//! │       │  nothing written above this line                               │
//! │       ▼                                                                 │
//! │  decrement inputs (sale units) ─► find/create output ─► output += N    │
//! │       │                                                                 │
//! │  persist once ─► unlock ─► INVENTORY_CHANGED + PRODUCTION_CHANGED      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All stock changes of a run land in one snapshot and one file write, so
//! a run is never half-applied.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bus::{ChangeBus, Topic};
use crate::config::ProductionSettings;
use crate::error::{ProductionError, ProductionResult, StoreError, StoreResult};
use crate::repository::ledger::{persist_sorted, position_of};
use crate::repository::recipe::RecipeStore;
use crate::storage::Storage;
use papeleria_core::recipe::{self, Pricing};
use papeleria_core::validation::validate_amount;
use papeleria_core::{
    money::round2, sku, units, Money, Product, ProductionInput, ProductionOrder, Recipe,
};

/// Slack allowed when comparing base-unit quantities.
pub const STOCK_EPSILON: f64 = 1e-9;

/// Unit given to manufactured products.
pub const OUTPUT_UNIT: &str = "Unidad";

const PRODUCTION_REASON: &str = "PRODUCTION";

/// Result of a successful production run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductionOutcome {
    /// SKU the finished units were booked under.
    pub output_sku: String,
    pub total_units: i64,
    /// Suggested price per finished unit. Not applied to the product.
    pub suggested_unit_price: Money,
    /// Whether the output product was created by this run.
    pub created_output: bool,
}

/// A saved recipe turned back into an order.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeReplay {
    pub order: ProductionOrder,
    /// Recipe SKUs no longer in the inventory; left out of `order`.
    pub missing_skus: Vec<String>,
    /// Cost of one finished unit at today's input prices.
    pub unit_cost: f64,
    /// `unit_cost` priced with the recipe's margin or fixed price.
    pub unit_price: f64,
}

/// Runs production orders and manages recipes built from them.
#[derive(Debug, Clone)]
pub struct ProductionEngine {
    storage: Arc<Storage>,
    bus: Arc<ChangeBus>,
    recipes: RecipeStore,
    settings: ProductionSettings,
}

impl ProductionEngine {
    pub fn new(storage: Arc<Storage>, bus: Arc<ChangeBus>, settings: ProductionSettings) -> Self {
        let recipes = RecipeStore::new(Arc::clone(&storage));
        ProductionEngine {
            storage,
            bus,
            recipes,
            settings,
        }
    }

    /// Manufactures `order.total_units()` finished units.
    ///
    /// ## Returns
    /// * `Ok(ProductionOutcome)` - Stock committed and notifications sent
    /// * `Err(ProductionError::Invalid)` - Order shape rejected
    /// * `Err(ProductionError::UnknownInput)` - An input SKU is missing
    /// * `Err(ProductionError::InsufficientStock)` - An input is short
    ///
    /// Only `ProductionError::Store` can follow a partial attempt, and even
    /// then the product file is written once or not at all.
    pub async fn produce(&self, order: &ProductionOrder) -> ProductionResult<ProductionOutcome> {
        order.validate()?;
        let total_units = order.total_units();
        let units_f = total_units as f64;
        info!(
            output = %order.output_name,
            total_units,
            inputs = order.inputs.len(),
            "Starting production run"
        );

        let guard = self.storage.lock().await;
        let mut products = self.storage.load_products().await?;

        // (index, sale-unit quantity) per distinct input product
        let mut consumption: Vec<(usize, f64)> = Vec::with_capacity(order.inputs.len());
        let mut priced_inputs: Vec<(f64, f64)> = Vec::with_capacity(order.inputs.len());
        for input in &order.inputs {
            let idx = position_of(&products, &input.sku).ok_or_else(|| {
                warn!(sku = %input.sku, "Production input not found");
                ProductionError::UnknownInput {
                    sku: input.sku.clone(),
                }
            })?;
            let qty = input.qty_per_unit * units_f;
            match consumption.iter_mut().find(|(i, _)| *i == idx) {
                Some((_, total)) => *total += qty,
                None => consumption.push((idx, qty)),
            }
            priced_inputs.push((products[idx].price.to_decimal(), input.qty_per_unit));
        }

        for &(idx, qty) in &consumption {
            let product = &products[idx];
            let required_base = units::to_base(product, qty);
            let available_base = units::to_base(product, product.stock);
            if available_base + STOCK_EPSILON < required_base {
                warn!(
                    sku = %product.sku,
                    required_base,
                    available_base,
                    "Production rejected: insufficient stock"
                );
                return Err(ProductionError::InsufficientStock {
                    sku: product.sku.clone(),
                    required_base,
                    available_base,
                });
            }
        }

        for &(idx, qty) in &consumption {
            products[idx].adjust_stock(-qty);
            debug!(sku = %products[idx].sku, consumed = qty, "Input consumed");
        }

        let (out_idx, created_output) = self.resolve_output(&mut products, order);
        products[out_idx].adjust_stock(units_f);
        let output_sku = products[out_idx].sku.clone();

        persist_sorted(&self.storage, &guard, &mut products).await?;
        drop(guard);

        self.bus.publish(Topic::InventoryChanged, PRODUCTION_REASON);
        self.bus.publish(Topic::ProductionChanged, PRODUCTION_REASON);

        let suggested = recipe::suggested_unit_price(
            priced_inputs,
            order.labor_cost_per_batch,
            order.units_per_batch,
            self.settings.margin_factor,
        );
        info!(sku = %output_sku, total_units, created_output, "Production committed");

        Ok(ProductionOutcome {
            output_sku,
            total_units,
            suggested_unit_price: Money::from_decimal(suggested),
            created_output,
        })
    }

    /// Finds the output product by explicit SKU, then by exact name, or
    /// appends a new one. Returns its index and whether it was created.
    fn resolve_output(&self, products: &mut Vec<Product>, order: &ProductionOrder) -> (usize, bool) {
        if let Some(idx) = order.explicit_sku().and_then(|s| position_of(products, s)) {
            return (idx, false);
        }
        if let Some(idx) = products.iter().position(|p| p.has_name(&order.output_name)) {
            return (idx, false);
        }

        let new_sku = match order.explicit_sku() {
            Some(s) => s.to_string(),
            None => sku::generate_sku(&order.output_name, products.iter().map(|p| p.sku.as_str())),
        };
        debug!(sku = %new_sku, name = %order.output_name, "Creating production output");

        products.push(
            Product::new(new_sku, order.output_name.trim(), OUTPUT_UNIT)
                .with_category(self.settings.category.clone())
                .with_content(1.0),
        );
        (products.len() - 1, true)
    }

    /// Sets the price of a manufactured product and pins it to one
    /// finished unit per sale unit.
    pub async fn apply_final_price(&self, sku: &str, price: Money) -> StoreResult<Product> {
        validate_amount("price", price.to_decimal())?;

        let guard = self.storage.lock().await;
        let mut products = self.storage.load_products().await?;
        let idx = position_of(&products, sku).ok_or_else(|| StoreError::not_found("Product", sku))?;

        let product = &mut products[idx];
        product.price = price;
        product.category = self.settings.category.clone();
        product.unit = OUTPUT_UNIT.to_string();
        product.content = 1.0;
        let updated = product.clone();
        debug!(sku = %updated.sku, price = %price, "Final price applied");

        persist_sorted(&self.storage, &guard, &mut products).await?;
        drop(guard);
        self.bus
            .publish(Topic::InventoryChanged, format!("upsert:{}", updated.sku));
        Ok(updated)
    }

    // =========================================================================
    // Recipes
    // =========================================================================

    pub fn recipes(&self) -> &RecipeStore {
        &self.recipes
    }

    /// Saves `order` as a recipe.
    ///
    /// Each input's per-unit quantity is stored in base units (2 decimals)
    /// so the recipe survives later changes to a product's package size.
    /// Labor is stored per finished unit.
    pub async fn save_recipe(&self, order: &ProductionOrder, pricing: Pricing) -> StoreResult<Recipe> {
        order.validate()?;
        let products = self.storage.load_products().await?;

        let mut recipe = Recipe::new(order.output_name.trim()).with_pricing(pricing);
        recipe.sku = order.explicit_sku().unwrap_or_default().to_string();
        recipe.labor_cost_per_unit = round2(order.labor_cost_per_batch / order.units_per_batch as f64);
        for input in &order.inputs {
            let idx = position_of(&products, &input.sku)
                .ok_or_else(|| StoreError::not_found("Product", input.sku.as_str()))?;
            recipe.items.push(input.to_recipe_item(&products[idx]));
        }

        self.recipes.upsert(recipe.clone()).await?;
        Ok(recipe)
    }

    /// Rebuilds an order from the recipe called `name`.
    ///
    /// Quantities are converted back to each input's current sale unit.
    /// Inputs whose SKU no longer exists are listed in `missing_skus`.
    pub async fn order_from_recipe(
        &self,
        name: &str,
        units_per_batch: i64,
        batch_count: i64,
    ) -> StoreResult<RecipeReplay> {
        let recipe = self
            .recipes
            .get_by_name(name)
            .await?
            .ok_or_else(|| StoreError::not_found("Recipe", name))?;
        let products = self.storage.load_products().await?;

        let mut order = ProductionOrder::new(recipe.name.clone(), units_per_batch, batch_count)
            .with_labor(recipe.labor_cost_per_unit * units_per_batch as f64);
        if !recipe.sku.trim().is_empty() {
            order = order.with_sku(recipe.sku.clone());
        }

        let mut missing_skus = Vec::new();
        let mut priced: Vec<(f64, f64)> = Vec::with_capacity(recipe.items.len());
        for item in &recipe.items {
            match position_of(&products, &item.sku) {
                Some(idx) => {
                    let input = ProductionInput::from_recipe_item(item, &products[idx]);
                    priced.push((products[idx].price.to_decimal(), input.qty_per_unit));
                    order.inputs.push(input);
                }
                None => missing_skus.push(item.sku.clone()),
            }
        }
        if !missing_skus.is_empty() {
            warn!(recipe = %recipe.name, missing = ?missing_skus, "Recipe inputs missing from inventory");
        }

        let unit_cost = recipe::unit_cost(priced, recipe.labor_cost_per_unit);
        let unit_price = recipe.unit_price(unit_cost);

        Ok(RecipeReplay {
            order,
            missing_skus,
            unit_cost,
            unit_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::ChangeEvent;
    use crate::repository::ledger::StockLedger;
    use crate::storage::StorageConfig;
    use papeleria_core::ValidationError;
    use std::sync::mpsc::Receiver;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        ledger: StockLedger,
        engine: ProductionEngine,
        events: Receiver<ChangeEvent>,
    }

    async fn fixture(products: Vec<Product>) -> Fixture {
        let dir = TempDir::new().unwrap();
        let storage = Arc::new(Storage::open(StorageConfig::new(dir.path())).await.unwrap());
        let bus = Arc::new(ChangeBus::new());
        let ledger = StockLedger::new(Arc::clone(&storage), Arc::clone(&bus));
        ledger.import_bulk(products).await.unwrap();

        let events = bus.subscribe_channel();
        let engine = ProductionEngine::new(storage, bus, ProductionSettings::default());
        Fixture {
            _dir: dir,
            ledger,
            engine,
            events,
        }
    }

    async fn stock(ledger: &StockLedger, sku: &str) -> f64 {
        ledger.find_by_sku(sku).await.unwrap().map(|p| p.stock).unwrap_or(-1.0)
    }

    fn ribbon() -> Product {
        Product::new("CIN-001", "Cinta satinada", "rollo")
            .with_content(10.0)
            .with_price(Money::from_cents(4000))
            .with_stock(2.0)
    }

    fn ring() -> Product {
        Product::new("ARG-001", "Argolla", "Unidad")
            .with_price(Money::from_cents(200))
            .with_stock(100.0)
    }

    #[tokio::test]
    async fn test_produce_consumes_inputs_and_creates_output() {
        let f = fixture(vec![ring()]).await;
        let order = ProductionOrder::new("Llavero", 10, 2).with_input("ARG-001", 1.0);

        let outcome = f.engine.produce(&order).await.unwrap();
        assert_eq!(outcome.total_units, 20);
        assert!(outcome.created_output);
        assert_eq!(outcome.output_sku, "LL-001");
        assert_eq!(stock(&f.ledger, "ARG-001").await, 80.0);
        assert_eq!(stock(&f.ledger, "LL-001").await, 20.0);

        let out = f.ledger.find_by_sku("LL-001").await.unwrap().unwrap();
        assert_eq!(out.category, "Producción");
        assert_eq!(out.unit, OUTPUT_UNIT);
        assert_eq!(out.content, 1.0);
        assert!(out.price.is_zero());

        let events: Vec<ChangeEvent> = f.events.try_iter().collect();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].topic, Topic::InventoryChanged);
        assert_eq!(events[0].reason, "PRODUCTION");
        assert_eq!(events[1].topic, Topic::ProductionChanged);
    }

    #[tokio::test]
    async fn test_insufficient_input_touches_nothing() {
        let f = fixture(vec![ring(), ribbon()]).await;
        // 20 units × 0.2 roll = 4 rolls (40 m) but only 2 rolls (20 m) held
        let order = ProductionOrder::new("Moño", 10, 2)
            .with_input("ARG-001", 1.0)
            .with_input("CIN-001", 0.2);

        let err = f.engine.produce(&order).await.unwrap_err();
        match err {
            ProductionError::InsufficientStock {
                sku,
                required_base,
                available_base,
            } => {
                assert_eq!(sku, "CIN-001");
                assert!((required_base - 40.0).abs() < 1e-9);
                assert_eq!(available_base, 20.0);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(stock(&f.ledger, "ARG-001").await, 100.0);
        assert_eq!(stock(&f.ledger, "CIN-001").await, 2.0);
        assert!(f.ledger.find_by_sku("MO-001").await.unwrap().is_none());
        assert_eq!(f.events.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_inputs_are_checked_together() {
        let f = fixture(vec![ring()]).await;
        let order = ProductionOrder::new("Par de argollas", 60, 1)
            .with_input("ARG-001", 1.0)
            .with_input("arg-001", 1.0);

        let err = f.engine.produce(&order).await.unwrap_err();
        assert!(matches!(err, ProductionError::InsufficientStock { .. }));
        assert_eq!(stock(&f.ledger, "ARG-001").await, 100.0);
    }

    #[tokio::test]
    async fn test_unknown_input_and_invalid_order() {
        let f = fixture(vec![ring()]).await;

        let order = ProductionOrder::new("Llavero", 1, 1).with_input("NOPE", 1.0);
        assert!(matches!(
            f.engine.produce(&order).await.unwrap_err(),
            ProductionError::UnknownInput { .. }
        ));

        let order = ProductionOrder::new("Llavero", 0, 1);
        assert!(matches!(
            f.engine.produce(&order).await.unwrap_err(),
            ProductionError::Invalid(_)
        ));
    }

    #[tokio::test]
    async fn test_output_found_by_name_or_explicit_sku() {
        let existing = Product::new("LLV-9", "Llavero", "Unidad").with_stock(5.0);
        let f = fixture(vec![ring(), existing]).await;

        let by_name = ProductionOrder::new("llavero", 2, 1).with_input("ARG-001", 1.0);
        let outcome = f.engine.produce(&by_name).await.unwrap();
        assert_eq!(outcome.output_sku, "LLV-9");
        assert!(!outcome.created_output);
        assert_eq!(stock(&f.ledger, "LLV-9").await, 7.0);

        let explicit = ProductionOrder::new("Llavero especial", 1, 1)
            .with_sku("LLE-1")
            .with_input("ARG-001", 1.0);
        let outcome = f.engine.produce(&explicit).await.unwrap();
        assert_eq!(outcome.output_sku, "LLE-1");
        assert!(outcome.created_output);
    }

    #[tokio::test]
    async fn test_explicit_sku_wins_over_same_name() {
        let named = Product::new("LLV-9", "Llavero", "Unidad").with_stock(5.0);
        let target = Product::new("LLV-2", "Llavero azul", "Unidad").with_stock(1.0);
        let f = fixture(vec![ring(), named, target]).await;

        let order = ProductionOrder::new("Llavero", 3, 1)
            .with_sku("llv-2")
            .with_input("ARG-001", 1.0);
        let outcome = f.engine.produce(&order).await.unwrap();
        assert_eq!(outcome.output_sku, "LLV-2");
        assert!(!outcome.created_output);
        assert_eq!(stock(&f.ledger, "LLV-2").await, 4.0);
        assert_eq!(stock(&f.ledger, "LLV-9").await, 5.0);

        // an explicit SKU that is not stocked falls back to the name
        let order = ProductionOrder::new("Llavero", 1, 1)
            .with_sku("LLV-77")
            .with_input("ARG-001", 1.0);
        let outcome = f.engine.produce(&order).await.unwrap();
        assert_eq!(outcome.output_sku, "LLV-9");
        assert_eq!(stock(&f.ledger, "LLV-9").await, 6.0);
        assert!(f.ledger.find_by_sku("LLV-77").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_output_is_also_an_input() {
        let f = fixture(vec![ring()]).await;
        // 10 units consume 5 argollas and yield 10
        let order = ProductionOrder::new("Argolla", 10, 1)
            .with_sku("ARG-001")
            .with_input("ARG-001", 0.5);

        let outcome = f.engine.produce(&order).await.unwrap();
        assert_eq!(outcome.output_sku, "ARG-001");
        assert!(!outcome.created_output);
        assert_eq!(stock(&f.ledger, "ARG-001").await, 105.0);
        assert_eq!(f.ledger.list().await.unwrap().len(), 1);
        assert_eq!(f.events.try_iter().count(), 2);
    }

    #[tokio::test]
    async fn test_oversized_or_malformed_order_rejected() {
        let f = fixture(vec![ring()]).await;

        let order = ProductionOrder::new("Llavero", i64::MAX / 2 + 1, 2).with_input("ARG-001", 1.0);
        assert!(matches!(
            f.engine.produce(&order).await.unwrap_err(),
            ProductionError::Invalid(ValidationError::TooLarge { .. })
        ));

        let order = ProductionOrder::new("Llavero", 1, 1)
            .with_sku("LL/01")
            .with_input("ARG-001", 1.0);
        assert!(matches!(
            f.engine.produce(&order).await.unwrap_err(),
            ProductionError::Invalid(ValidationError::InvalidFormat { .. })
        ));

        assert_eq!(stock(&f.ledger, "ARG-001").await, 100.0);
        assert_eq!(f.events.try_iter().count(), 0);
    }

    #[tokio::test]
    async fn test_suggested_price() {
        let f = fixture(vec![ring()]).await;
        // (2.00 × 1 + 8.00) / 10 × 1.5 = 1.50
        let order = ProductionOrder::new("Llavero", 10, 1)
            .with_input("ARG-001", 1.0)
            .with_labor(8.0);
        let outcome = f.engine.produce(&order).await.unwrap();
        assert_eq!(outcome.suggested_unit_price, Money::from_cents(150));
    }

    #[tokio::test]
    async fn test_apply_final_price() {
        let f = fixture(vec![ring()]).await;
        let order = ProductionOrder::new("Llavero", 1, 1).with_input("ARG-001", 1.0);
        let outcome = f.engine.produce(&order).await.unwrap();

        let updated = f
            .engine
            .apply_final_price(&outcome.output_sku, Money::from_cents(2500))
            .await
            .unwrap();
        assert_eq!(updated.price, Money::from_cents(2500));
        assert_eq!(
            f.ledger.find_by_sku("LL-001").await.unwrap().unwrap().price,
            Money::from_cents(2500)
        );

        let err = f
            .engine
            .apply_final_price("NOPE", Money::from_cents(100))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_recipe_save_and_replay() {
        let f = fixture(vec![ring(), ribbon()]).await;
        let order = ProductionOrder::new("Moño", 10, 1)
            .with_sku("MO-001")
            .with_input("CIN-001", 0.05)
            .with_input("ARG-001", 1.0)
            .with_labor(5.0);

        let saved = f.engine.save_recipe(&order, Pricing::Margin(50.0)).await.unwrap();
        assert_eq!(saved.items[0].base_quantity, 0.5);
        assert_eq!(saved.labor_cost_per_unit, 0.5);

        let replay = f.engine.order_from_recipe("moño", 4, 2).await.unwrap();
        assert!(replay.missing_skus.is_empty());
        assert_eq!(replay.order.output_sku.as_deref(), Some("MO-001"));
        assert_eq!(replay.order.total_units(), 8);
        assert!((replay.order.inputs[0].qty_per_unit - 0.05).abs() < 1e-12);
        assert_eq!(replay.order.labor_cost_per_batch, 2.0);
        // 40.00 × 0.05 + 2.00 × 1 + 0.50 = 4.50, +50% = 6.75
        assert_eq!(replay.unit_cost, 4.5);
        assert_eq!(replay.unit_price, 6.75);
    }

    #[tokio::test]
    async fn test_replay_reports_missing_inputs() {
        let f = fixture(vec![ring(), ribbon()]).await;
        let order = ProductionOrder::new("Moño", 1, 1)
            .with_input("CIN-001", 0.05)
            .with_input("ARG-001", 1.0);
        f.engine.save_recipe(&order, Pricing::Fixed(12.0)).await.unwrap();
        f.ledger.remove_by_sku("CIN-001").await.unwrap();

        let replay = f.engine.order_from_recipe("Moño", 1, 1).await.unwrap();
        assert_eq!(replay.missing_skus, vec!["CIN-001"]);
        assert_eq!(replay.order.inputs.len(), 1);
        assert_eq!(replay.unit_price, 12.0);

        let err = f.engine.order_from_recipe("Nada", 1, 1).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}
