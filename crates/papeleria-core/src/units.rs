//! # Unit Conversion
//!
//! Maps quantities between a product's sale unit and its base unit.
//!
//! ## Unit Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  unit label (trimmed, lowercase)   kind       base unit                 │
//! │  ─────────────────────────────     ────────   ─────────────────────     │
//! │  "paquete"                         Package    piece / sheet             │
//! │  "caja"                            Box        piece / sheet             │
//! │  "rollo"                           Roll       meter                     │
//! │  "m" | "metro" | "metros"          Meter      meter (1:1)               │
//! │  anything else                     Loose      piece (1:1)               │
//! │                                                                         │
//! │  Only Package, Box and Roll carry a `content` multiplier:               │
//! │                                                                         │
//! │     to_base(p, q)   = q × content   (content > 0)                       │
//! │     from_base(p, q) = q ÷ content   (content > 0)                       │
//! │     otherwise identity                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Presentations
//! A cashier can sell a package by the sheet or a roll by the centimeter.
//! [`Presentation`] names the unit picked for one cart or production line;
//! [`to_sale_unit`] turns a presentation quantity back into sale units,
//! which is what stock is counted in.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Product;

// =============================================================================
// Unit Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Loose,
    Package,
    Box,
    Roll,
    Meter,
}

impl UnitKind {
    /// Parses a free-form unit label. Unknown labels are loose pieces.
    pub fn parse(label: &str) -> UnitKind {
        match label.trim().to_lowercase().as_str() {
            "paquete" => UnitKind::Package,
            "caja" => UnitKind::Box,
            "rollo" => UnitKind::Roll,
            "m" | "metro" | "metros" => UnitKind::Meter,
            _ => UnitKind::Loose,
        }
    }

    /// Whether `content` multiplies this kind into base units.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, UnitKind::Package | UnitKind::Box | UnitKind::Roll)
    }

    /// Label used when offering the product's own unit.
    pub fn label(&self) -> &'static str {
        match self {
            UnitKind::Package => "Paquete",
            UnitKind::Box => "Caja",
            UnitKind::Roll => "Rollo",
            UnitKind::Meter => "Metro",
            UnitKind::Loose => "Unidad",
        }
    }
}

// =============================================================================
// Base Conversion
// =============================================================================

fn multiplier(product: &Product) -> Option<f64> {
    let content = product.effective_content();
    if product.unit_kind().is_container() && content > 0.0 {
        Some(content)
    } else {
        None
    }
}

/// Converts a sale-unit quantity to base units.
///
/// ## Example
/// ```rust
/// use papeleria_core::{units, Product};
///
/// let roll = Product::new("CIN-001", "Cinta", "rollo").with_content(10.0);
/// assert_eq!(units::to_base(&roll, 2.5), 25.0);
/// ```
pub fn to_base(product: &Product, qty: f64) -> f64 {
    match multiplier(product) {
        Some(content) => qty * content,
        None => qty,
    }
}

/// Converts a base-unit quantity back to sale units.
pub fn from_base(product: &Product, qty: f64) -> f64 {
    match multiplier(product) {
        Some(content) => qty / content,
        None => qty,
    }
}

/// Human-readable rendering of a base quantity.
///
/// ```text
/// Roll,  base ≥ 1    ──► "≈ 2.50 m"
/// Roll,  base < 1    ──► "≈ 50 cm"
/// name contains hoja ──► "≈ 500 hojas"
/// otherwise          ──► "≈ 12 pzas"
/// ```
pub fn pretty_base(product: &Product, base_qty: f64) -> String {
    if product.unit_kind() == UnitKind::Roll {
        if base_qty >= 1.0 {
            return format!("≈ {:.2} m", base_qty);
        }
        return format!("≈ {:.0} cm", base_qty * 100.0);
    }
    if product.name.to_lowercase().contains("hoja") {
        format!("≈ {:.0} hojas", base_qty)
    } else {
        format!("≈ {:.0} pzas", base_qty)
    }
}

// =============================================================================
// Presentations
// =============================================================================

/// The unit a line is entered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    /// The product's own unit (package, box, roll, meter or loose piece).
    SaleUnit,
    /// One piece out of a package or box.
    Piece,
    /// One sheet out of a package or box.
    Sheet,
    /// One meter off a roll.
    Meter,
    /// One centimeter off a roll or a meter-sold product.
    Centimeter,
}

impl Presentation {
    /// Label for this presentation of `product`.
    pub fn label(&self, product: &Product) -> &'static str {
        match self {
            Presentation::SaleUnit => product.unit_kind().label(),
            Presentation::Piece => "Pieza",
            Presentation::Sheet => "Hoja",
            Presentation::Meter => "Metro",
            Presentation::Centimeter => "Centímetro",
        }
    }
}

/// Presentations a product can be sold or consumed in, own unit first.
///
/// ## Example
/// ```rust
/// use papeleria_core::units::{presentations_for, Presentation};
/// use papeleria_core::Product;
///
/// let ream = Product::new("PAP-001", "Hojas blancas carta", "paquete").with_content(500.0);
/// assert_eq!(presentations_for(&ream), vec![Presentation::SaleUnit, Presentation::Sheet]);
/// ```
pub fn presentations_for(product: &Product) -> Vec<Presentation> {
    let mut out = vec![Presentation::SaleUnit];
    let has_content = product.effective_content() > 0.0;

    match product.unit_kind() {
        UnitKind::Package | UnitKind::Box if has_content => {
            if product.name.to_lowercase().contains("hoja") {
                out.push(Presentation::Sheet);
            } else {
                out.push(Presentation::Piece);
            }
        }
        UnitKind::Roll if has_content => {
            out.push(Presentation::Meter);
            out.push(Presentation::Centimeter);
        }
        UnitKind::Meter => out.push(Presentation::Centimeter),
        _ => {}
    }
    out
}

fn unsupported(product: &Product, presentation: Presentation) -> CoreError {
    CoreError::UnsupportedPresentation {
        sku: product.sku.clone(),
        presentation: presentation.label(product).to_string(),
    }
}

/// Converts a quantity entered in `presentation` to the product's sale unit.
///
/// ## Returns
/// * `Ok(qty)` - quantity to deduct from stock
/// * `Err(CoreError::UnsupportedPresentation)` - the product cannot be
///   split that way (wrong kind, or no content to divide by)
pub fn to_sale_unit(product: &Product, presentation: Presentation, qty: f64) -> CoreResult<f64> {
    let kind = product.unit_kind();
    let content = product.effective_content();

    match (presentation, kind) {
        (Presentation::SaleUnit, _) => Ok(qty),
        (Presentation::Piece | Presentation::Sheet, UnitKind::Package | UnitKind::Box)
            if content > 0.0 =>
        {
            Ok(qty / content)
        }
        (Presentation::Meter, UnitKind::Roll) if content > 0.0 => Ok(qty / content),
        (Presentation::Meter, UnitKind::Meter) => Ok(qty),
        (Presentation::Centimeter, UnitKind::Roll) if content > 0.0 => Ok((qty / 100.0) / content),
        (Presentation::Centimeter, UnitKind::Meter) => Ok(qty / 100.0),
        _ => Err(unsupported(product, presentation)),
    }
}

/// Price of one `presentation` unit of `product`.
pub fn unit_price_for(product: &Product, presentation: Presentation) -> CoreResult<f64> {
    let per_sale_unit = to_sale_unit(product, presentation, 1.0)?;
    Ok(product.price.to_decimal() * per_sale_unit)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    fn roll() -> Product {
        Product::new("CIN-001", "Cinta canela", "Rollo")
            .with_content(10.0)
            .with_price(Money::from_cents(4500))
    }

    fn ream() -> Product {
        Product::new("PAP-001", "Hojas blancas carta", "paquete")
            .with_content(500.0)
            .with_price(Money::from_cents(9500))
    }

    #[test]
    fn test_parse_unit_labels() {
        assert_eq!(UnitKind::parse(" Paquete "), UnitKind::Package);
        assert_eq!(UnitKind::parse("CAJA"), UnitKind::Box);
        assert_eq!(UnitKind::parse("rollo"), UnitKind::Roll);
        assert_eq!(UnitKind::parse("metros"), UnitKind::Meter);
        assert_eq!(UnitKind::parse("pza"), UnitKind::Loose);
        assert_eq!(UnitKind::parse(""), UnitKind::Loose);
    }

    #[test]
    fn test_roll_to_base() {
        let p = roll();
        assert_eq!(to_base(&p, 1.0), 10.0);
        assert_eq!(to_base(&p, 2.5), 25.0);
    }

    #[test]
    fn test_identity_without_content() {
        let p = Product::new("X", "Pluma", "Unidad").with_content(12.0);
        assert_eq!(to_base(&p, 3.0), 3.0);

        let empty_box = Product::new("Y", "Clips", "caja");
        assert_eq!(to_base(&empty_box, 3.0), 3.0);
        assert_eq!(from_base(&empty_box, 3.0), 3.0);

        let negative = Product::new("Z", "Clips", "caja").with_content(-4.0);
        assert_eq!(to_base(&negative, 3.0), 3.0);
    }

    #[test]
    fn test_base_round_trip_every_kind() {
        let products = [
            Product::new("A", "Clips", "caja").with_content(100.0),
            Product::new("B", "Hojas", "paquete").with_content(500.0),
            Product::new("C", "Cinta", "rollo").with_content(33.0),
            Product::new("D", "Listón", "metro").with_content(7.0),
            Product::new("E", "Goma", "Unidad").with_content(3.0),
        ];
        for p in &products {
            for x in [0.0, 0.37, 1.0, 12.5, 999.0] {
                let back = to_base(p, from_base(p, x));
                assert!((back - x).abs() < 1e-9, "{} {}", p.unit, x);
            }
        }
    }

    #[test]
    fn test_pretty_base() {
        assert_eq!(pretty_base(&roll(), 2.5), "≈ 2.50 m");
        assert_eq!(pretty_base(&roll(), 0.5), "≈ 50 cm");
        assert_eq!(pretty_base(&ream(), 500.0), "≈ 500 hojas");
        let pens = Product::new("P", "Pluma azul", "caja").with_content(12.0);
        assert_eq!(pretty_base(&pens, 24.0), "≈ 24 pzas");
    }

    #[test]
    fn test_presentations() {
        assert_eq!(
            presentations_for(&roll()),
            vec![Presentation::SaleUnit, Presentation::Meter, Presentation::Centimeter]
        );
        let pens = Product::new("P", "Pluma azul", "caja").with_content(12.0);
        assert_eq!(presentations_for(&pens), vec![Presentation::SaleUnit, Presentation::Piece]);

        let loose = Product::new("L", "Goma", "Unidad");
        assert_eq!(presentations_for(&loose), vec![Presentation::SaleUnit]);
        assert_eq!(Presentation::SaleUnit.label(&loose), "Unidad");

        let ribbon = Product::new("R", "Listón", "m");
        assert_eq!(presentations_for(&ribbon), vec![Presentation::SaleUnit, Presentation::Centimeter]);
    }

    #[test]
    fn test_to_sale_unit() {
        assert_eq!(to_sale_unit(&ream(), Presentation::Sheet, 50.0).unwrap(), 0.1);
        assert_eq!(to_sale_unit(&roll(), Presentation::Meter, 5.0).unwrap(), 0.5);
        assert!((to_sale_unit(&roll(), Presentation::Centimeter, 250.0).unwrap() - 0.25).abs() < 1e-12);

        let ribbon = Product::new("R", "Listón", "metros");
        assert_eq!(to_sale_unit(&ribbon, Presentation::Centimeter, 50.0).unwrap(), 0.5);

        let loose = Product::new("L", "Goma", "Unidad");
        assert!(to_sale_unit(&loose, Presentation::Sheet, 1.0).is_err());
    }

    #[test]
    fn test_unit_price_for() {
        let sheet = unit_price_for(&ream(), Presentation::Sheet).unwrap();
        assert!((sheet - 0.19).abs() < 1e-12);
        let cm = unit_price_for(&roll(), Presentation::Centimeter).unwrap();
        assert!((cm - 0.045).abs() < 1e-12);
    }
}
