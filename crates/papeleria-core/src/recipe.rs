//! # Recipes and Production Orders
//!
//! A recipe is a named bill of materials. A production order is one run
//! of it: how many finished units per batch, how many batches, and how
//! much of each input one finished unit consumes.
//!
//! ## Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductionInput.qty_per_unit   input's SALE unit, per finished unit    │
//! │  RecipeItem.base_quantity       input's BASE unit, per finished unit    │
//! │                                                                         │
//! │  save:    base_quantity = round2(to_base(p, qty_per_unit))              │
//! │  replay:  qty_per_unit  = from_base(p, base_quantity)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::round2;
use crate::types::{eq_ignore_case, Product};
use crate::units;
use crate::validation::{validate_quantity, validate_required, validate_sku};

/// Margin applied when a recipe carries none.
pub const DEFAULT_MARGIN_PERCENT: f64 = 50.0;

// =============================================================================
// Recipe
// =============================================================================

/// One bill-of-materials line, in the input's base unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RecipeItem {
    pub sku: String,

    #[serde(rename = "cantidadBase")]
    pub base_quantity: f64,
}

/// How a recipe prices its finished product.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricing {
    /// Unit cost × (1 + percent / 100).
    Margin(f64),
    /// A fixed unit price.
    Fixed(f64),
}

/// A named bill of materials.
///
/// On disk the pricing mode is two numbers (`margen`, `precioDirecto`)
/// where a positive fixed price wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Recipe {
    #[serde(rename = "nombre")]
    pub name: String,

    /// SKU of the finished product, if one was assigned.
    #[serde(default)]
    pub sku: String,

    #[serde(rename = "margen", default)]
    pub margin: f64,

    #[serde(rename = "precioDirecto", default)]
    pub fixed_price: f64,

    #[serde(rename = "manoObraUnit", default)]
    pub labor_cost_per_unit: f64,

    #[serde(default)]
    pub items: Vec<RecipeItem>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Recipe {
            name: name.into(),
            sku: String::new(),
            margin: DEFAULT_MARGIN_PERCENT,
            fixed_price: 0.0,
            labor_cost_per_unit: 0.0,
            items: Vec::new(),
        }
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        match pricing {
            Pricing::Margin(pct) => {
                self.margin = pct;
                self.fixed_price = 0.0;
            }
            Pricing::Fixed(price) => {
                self.margin = 0.0;
                self.fixed_price = price;
            }
        }
        self
    }

    pub fn pricing(&self) -> Pricing {
        if self.fixed_price > 0.0 {
            Pricing::Fixed(self.fixed_price)
        } else if self.margin > 0.0 {
            Pricing::Margin(self.margin)
        } else {
            Pricing::Margin(DEFAULT_MARGIN_PERCENT)
        }
    }

    pub fn has_name(&self, name: &str) -> bool {
        eq_ignore_case(&self.name, name)
    }

    /// Unit price for a finished unit costing `unit_cost`.
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::recipe::{Pricing, Recipe};
    ///
    /// let r = Recipe::new("Llavero");
    /// assert_eq!(r.unit_price(10.0), 15.0);
    ///
    /// let fixed = Recipe::new("Llavero").with_pricing(Pricing::Fixed(25.0));
    /// assert_eq!(fixed.unit_price(10.0), 25.0);
    /// ```
    pub fn unit_price(&self, unit_cost: f64) -> f64 {
        match self.pricing() {
            Pricing::Fixed(price) => round2(price),
            Pricing::Margin(pct) => round2(unit_cost * (1.0 + pct / 100.0)),
        }
    }
}

// =============================================================================
// Production Orders
// =============================================================================

/// One input of a production run (`InsumoReq`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductionInput {
    pub sku: String,

    /// Amount of the input, in its own sale unit, per finished unit.
    pub qty_per_unit: f64,
}

impl ProductionInput {
    pub fn new(sku: impl Into<String>, qty_per_unit: f64) -> Self {
        ProductionInput {
            sku: sku.into(),
            qty_per_unit,
        }
    }

    /// Converts to a recipe line, storing the base quantity to 2 decimals.
    pub fn to_recipe_item(&self, product: &Product) -> RecipeItem {
        RecipeItem {
            sku: product.sku.clone(),
            base_quantity: round2(units::to_base(product, self.qty_per_unit)),
        }
    }

    /// Rebuilds an input from a recipe line.
    pub fn from_recipe_item(item: &RecipeItem, product: &Product) -> Self {
        ProductionInput {
            sku: product.sku.clone(),
            qty_per_unit: units::from_base(product, item.base_quantity),
        }
    }
}

/// A request to manufacture `units_per_batch × batch_count` finished units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductionOrder {
    pub output_name: String,
    pub output_sku: Option<String>,
    pub units_per_batch: i64,
    pub batch_count: i64,
    pub inputs: Vec<ProductionInput>,
    pub labor_cost_per_batch: f64,
}

impl ProductionOrder {
    pub fn new(output_name: impl Into<String>, units_per_batch: i64, batch_count: i64) -> Self {
        ProductionOrder {
            output_name: output_name.into(),
            output_sku: None,
            units_per_batch,
            batch_count,
            inputs: Vec::new(),
            labor_cost_per_batch: 0.0,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.output_sku = Some(sku.into());
        self
    }

    pub fn with_input(mut self, sku: impl Into<String>, qty_per_unit: f64) -> Self {
        self.inputs.push(ProductionInput::new(sku, qty_per_unit));
        self
    }

    pub fn with_labor(mut self, labor_cost_per_batch: f64) -> Self {
        self.labor_cost_per_batch = labor_cost_per_batch;
        self
    }

    /// Non-blank explicit output SKU.
    pub fn explicit_sku(&self) -> Option<&str> {
        self.output_sku
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// `units_per_batch × batch_count`, saturating. `validate()` rejects
    /// orders where the product does not fit.
    pub fn total_units(&self) -> i64 {
        self.units_per_batch.saturating_mul(self.batch_count)
    }

    /// Shape checks that need no stock lookups.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required("output_name", &self.output_name)?;
        if self.units_per_batch <= 0 {
            return Err(ValidationError::must_be_positive("units_per_batch"));
        }
        if self.batch_count <= 0 {
            return Err(ValidationError::must_be_positive("batch_count"));
        }
        if self.units_per_batch.checked_mul(self.batch_count).is_none() {
            return Err(ValidationError::TooLarge {
                field: "total_units".to_string(),
            });
        }
        if let Some(sku) = self.explicit_sku() {
            validate_sku(sku)?;
        }
        for input in &self.inputs {
            validate_required("input sku", &input.sku)?;
            validate_quantity("qty_per_unit", input.qty_per_unit)?;
        }
        Ok(())
    }
}

/// Suggested price for one finished unit.
///
/// `(Σ price × qty_per_unit + labor_cost_per_batch) / units_per_batch × factor`,
/// rounded to 2 decimals. `inputs` yields `(input price per sale unit,
/// qty_per_unit)` pairs.
pub fn suggested_unit_price<I>(inputs: I, labor_cost_per_batch: f64, units_per_batch: i64, factor: f64) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let materials: f64 = inputs.into_iter().map(|(price, qty)| price * qty).sum();
    let per_unit = (materials + labor_cost_per_batch) / units_per_batch.max(1) as f64;
    round2(per_unit * factor)
}

/// Material cost of one finished unit plus its labor, as the recipe
/// editor shows it: each line rounded to cents, then the sum.
pub fn unit_cost<I>(inputs: I, labor_cost_per_unit: f64) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let materials: f64 = inputs.into_iter().map(|(price, qty)| round2(price * qty)).sum();
    round2(materials + labor_cost_per_unit)
}
