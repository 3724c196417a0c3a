//! # Domain Types
//!
//! Core domain types shared by the stock ledger, the sales engine and the
//! production engine.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku (key, ci)  │   │  id (8 chars)   │   │  sku (snapshot) │       │
//! │  │  unit + content │   │  timestamp      │   │  quantity       │       │
//! │  │  price (Money)  │   │  total / cash   │   │  unit_price     │       │
//! │  │  stock (f64)    │   │  change         │   │  subtotal       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │      Role       │   │    Session      │                             │
//! │  │  Admin | Seller │   │  username, role │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## On-Disk Names
//! Records keep the Spanish field names of the shop's existing data files
//! (`nombre`, `precio`, `efectivo`, ...) via `#[serde(rename)]`.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::units::UnitKind;

// =============================================================================
// Product
// =============================================================================

/// A product held in stock.
///
/// `stock` is counted in the product's own sale unit (packages, rolls,
/// loose pieces). `content` is how many base units one sale unit holds;
/// zero means the product is sold 1:1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub sku: String,

    #[serde(rename = "nombre", default)]
    pub name: String,

    #[serde(rename = "categoria", default)]
    pub category: String,

    /// Free-form unit label ("Unidad", "paquete", "Rollo", "m", ...).
    #[serde(rename = "unidad", default)]
    pub unit: String,

    #[serde(rename = "contenido", default)]
    pub content: f64,

    #[serde(rename = "precio", default)]
    #[ts(type = "number")]
    pub price: Money,

    #[serde(default)]
    pub stock: f64,
}

impl Product {
    /// Creates a product with no content, zero price and zero stock.
    pub fn new(sku: impl Into<String>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Product {
            sku: sku.into(),
            name: name.into(),
            category: String::new(),
            unit: unit.into(),
            content: 0.0,
            price: Money::zero(),
            stock: 0.0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_content(mut self, content: f64) -> Self {
        self.content = content;
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn with_stock(mut self, stock: f64) -> Self {
        self.stock = stock;
        self
    }

    /// Parsed unit kind of this product.
    #[inline]
    pub fn unit_kind(&self) -> UnitKind {
        UnitKind::parse(&self.unit)
    }

    /// Content clamped to zero.
    #[inline]
    pub fn effective_content(&self) -> f64 {
        clamp_non_negative(self.content)
    }

    /// Applies the boundary rules every persisted product obeys:
    /// negative (or NaN) content and stock become zero, price is never
    /// negative.
    pub fn normalized(mut self) -> Self {
        self.content = clamp_non_negative(self.content);
        self.stock = clamp_non_negative(self.stock);
        self.price = self.price.non_negative();
        self
    }

    /// Adds `delta` (sale units) to stock, clamping at zero.
    ///
    /// ## Example
    /// ```rust
    /// use papeleria_core::Product;
    ///
    /// let mut p = Product::new("LAP-001", "Lápiz", "Unidad").with_stock(3.0);
    /// p.adjust_stock(-1e9);
    /// assert_eq!(p.stock, 0.0);
    /// ```
    pub fn adjust_stock(&mut self, delta: f64) {
        self.stock = clamp_non_negative(self.stock + delta);
    }

    /// Case-insensitive SKU comparison, ignoring surrounding whitespace.
    pub fn has_sku(&self, sku: &str) -> bool {
        eq_ignore_case(&self.sku, sku)
    }

    /// Case-insensitive name comparison, ignoring surrounding whitespace.
    pub fn has_name(&self, name: &str) -> bool {
        eq_ignore_case(&self.name, name)
    }

    /// Case-insensitive substring match over sku, name and category.
    /// A blank query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return true;
        }
        self.sku.to_lowercase().contains(&q)
            || self.name.to_lowercase().contains(&q)
            || self.category.to_lowercase().contains(&q)
    }

    /// Key the ledger sorts by: name, then SKU, both case-insensitive.
    pub fn sort_key(&self) -> (String, String) {
        (self.name.to_lowercase(), self.sku.to_lowercase())
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line in a committed sale.
///
/// `quantity` is in the product's sale unit (it is what gets deducted
/// from stock) and `unit_price` is the price of one sale unit, so
/// `subtotal = quantity × unit_price` regardless of which presentation
/// the cashier used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItem {
    pub sku: String,

    #[serde(rename = "nombre", default)]
    pub name: String,

    #[serde(rename = "cantidadBase")]
    pub quantity: f64,

    #[serde(rename = "precioUnitario")]
    pub unit_price: f64,

    pub subtotal: f64,
}

impl SaleItem {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        SaleItem {
            sku: sku.into(),
            name: name.into(),
            quantity,
            unit_price,
            subtotal: quantity * unit_price,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale with its cash payment.
///
/// ## Derived Fields
/// ```text
/// add_item / set_items ──► total = Σ subtotals (to cents)
/// set_total            ──► total overridden (cash rounding)
/// any of the above
///   or set_cash_tendered ──► change = cash_tendered − total
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Sale {
    pub id: String,

    #[serde(rename = "fecha")]
    #[ts(as = "String")]
    pub timestamp: NaiveDateTime,

    #[serde(default)]
    items: Vec<SaleItem>,

    #[ts(type = "number")]
    total: Money,

    #[serde(rename = "efectivo", default)]
    #[ts(type = "number")]
    cash_tendered: Money,

    #[serde(rename = "cambio", default)]
    #[ts(type = "number")]
    change: Money,
}

impl Sale {
    /// Creates an empty sale stamped with the current local time.
    pub fn new(id: impl Into<String>) -> Self {
        Sale {
            id: id.into(),
            timestamp: Local::now().naive_local(),
            items: Vec::new(),
            total: Money::zero(),
            cash_tendered: Money::zero(),
            change: Money::zero(),
        }
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total(&self) -> Money {
        self.total
    }

    pub fn cash_tendered(&self) -> Money {
        self.cash_tendered
    }

    pub fn change(&self) -> Money {
        self.change
    }

    /// Unrounded Σ subtotals.
    pub fn raw_total(&self) -> f64 {
        self.items.iter().map(|i| i.subtotal).sum()
    }

    pub fn add_item(&mut self, item: SaleItem) {
        self.items.push(item);
        self.recalculate();
    }

    pub fn set_items(&mut self, items: Vec<SaleItem>) {
        self.items = items;
        self.recalculate();
    }

    /// Overrides the computed total (used after cash rounding).
    pub fn set_total(&mut self, total: Money) {
        self.total = total;
        self.change = self.cash_tendered - self.total;
    }

    pub fn set_cash_tendered(&mut self, cash: Money) {
        self.cash_tendered = cash;
        self.change = self.cash_tendered - self.total;
    }

    fn recalculate(&mut self) {
        self.total = Money::from_decimal(self.raw_total());
        self.change = self.cash_tendered - self.total;
    }
}

// =============================================================================
// Role / Session
// =============================================================================

/// Who is operating the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    #[default]
    Seller,
}

impl Role {
    /// Tolerant parser: anything other than "admin" is a seller.
    pub fn parse(value: &str) -> Role {
        if value.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Seller
        }
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Seller => "SELLER",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted session record (`session.json`).
///
/// The role is kept as raw text on disk; an empty file value means
/// nobody is logged in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Session {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub role: String,
}

impl Session {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Session {
            username: username.into(),
            role: role.as_str().to_string(),
        }
    }

    pub fn role(&self) -> Role {
        Role::parse(&self.role)
    }

    pub fn is_logged_in(&self) -> bool {
        !self.username.trim().is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_normalized_clamps() {
        let p = Product::new("X", "Cinta", "Rollo")
            .with_content(-5.0)
            .with_stock(-2.0)
            .with_price(Money::from_cents(-100))
            .normalized();
        assert_eq!(p.content, 0.0);
        assert_eq!(p.stock, 0.0);
        assert_eq!(p.price, Money::zero());
    }

    #[test]
    fn test_product_sku_is_case_insensitive() {
        let p = Product::new("ABC-1", "Borrador", "Unidad");
        assert!(p.has_sku("abc-1"));
        assert!(p.has_sku("  Abc-1 "));
        assert!(!p.has_sku("abc-2"));
    }

    #[test]
    fn test_matches_query() {
        let p = Product::new("CUA-001", "Cuaderno Profesional", "Unidad").with_category("Libretas");
        assert!(p.matches_query("cuaderno"));
        assert!(p.matches_query("cua-0"));
        assert!(p.matches_query("LIBRE"));
        assert!(p.matches_query("   "));
        assert!(!p.matches_query("pluma"));
    }

    #[test]
    fn test_sale_change_follows_total_and_cash() {
        let mut sale = Sale::new("abcd1234");
        sale.add_item(SaleItem::new("A", "Lápiz", 2.0, 3.55));
        assert_eq!(sale.total().cents(), 710);

        sale.set_total(Money::from_cents(700));
        sale.set_cash_tendered(Money::from_cents(1000));
        assert_eq!(sale.change().cents(), 300);

        sale.set_total(Money::from_cents(750));
        assert_eq!(sale.change().cents(), 250);
    }

    #[test]
    fn test_sale_json_uses_spanish_names() {
        let mut sale = Sale::new("abcd1234");
        sale.add_item(SaleItem::new("A", "Lápiz", 1.0, 5.0));
        let json = serde_json::to_value(&sale).unwrap();
        assert!(json.get("fecha").is_some());
        assert!(json.get("efectivo").is_some());
        assert_eq!(json["items"][0]["cantidadBase"], 1.0);
        assert_eq!(json["items"][0]["precioUnitario"], 5.0);

        let back: Sale = serde_json::from_value(json).unwrap();
        assert_eq!(back.total().cents(), 500);
    }

    #[test]
    fn test_role_parse_is_tolerant() {
        assert_eq!(Role::parse("ADMIN"), Role::Admin);
        assert_eq!(Role::parse(" admin "), Role::Admin);
        assert_eq!(Role::parse(""), Role::Seller);
        assert_eq!(Role::parse("cajero"), Role::Seller);
    }

    #[test]
    fn test_session_role() {
        let s = Session::new("ana", Role::Admin);
        assert!(s.is_logged_in());
        assert!(s.role().is_admin());
        assert!(!Session::default().is_logged_in());
    }
}
