//! # Bulk Import Rows
//!
//! Turns spreadsheet rows into products for `StockLedger::import_bulk`.
//! Reading the spreadsheet itself is the caller's job; this module only
//! sees rows of cell text.
//!
//! ## Column Layout
//! ```text
//! ┌─────┬────────┬───────────┬────────┬───────────┬────────┬───────┐
//! │  0  │   1    │     2     │   3    │     4     │   5    │   6   │
//! │ sku │ nombre │ categoria │ unidad │ contenido │ precio │ stock │
//! └─────┴────────┴───────────┴────────┴───────────┴────────┴───────┘
//!   row 0 is a header and is always skipped
//! ```
//!
//! Numeric cells accept a comma decimal separator ("12,50"). Anything
//! that still fails to parse counts as 0.

use crate::money::Money;
use crate::types::Product;

/// Parses a numeric cell; blank or malformed text is 0.0.
///
/// ## Example
/// ```rust
/// use papeleria_core::import::parse_number;
///
/// assert_eq!(parse_number(" 12,5 "), 12.5);
/// assert_eq!(parse_number("n/a"), 0.0);
/// ```
pub fn parse_number(cell: &str) -> f64 {
    let text = cell.trim().replace(',', ".");
    if text.is_empty() {
        return 0.0;
    }
    text.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(|s| s.trim()).unwrap_or("")
}

/// Builds a product from one data row, or `None` when the SKU is blank.
pub fn product_from_row(row: &[String]) -> Option<Product> {
    let sku = cell(row, 0);
    if sku.is_empty() {
        return None;
    }

    let product = Product::new(sku, cell(row, 1), cell(row, 3))
        .with_category(cell(row, 2))
        .with_content(parse_number(cell(row, 4)))
        .with_price(Money::from_decimal(parse_number(cell(row, 5))))
        .with_stock(parse_number(cell(row, 6)));

    Some(product)
}

/// Converts a whole sheet (header included) into products.
pub fn products_from_rows<I>(rows: I) -> Vec<Product>
where
    I: IntoIterator<Item = Vec<String>>,
{
    rows.into_iter()
        .skip(1)
        .filter_map(|row| product_from_row(&row))
        .collect()
}

/// Splits delimited text (one row per line) into cell rows.
///
/// Used for sheets exported as CSV/TSV. Quoting is not interpreted.
pub fn rows_from_delimited(text: &str, delimiter: char) -> Vec<Vec<String>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(delimiter).map(str::to_string).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_header_and_blank_sku_skipped() {
        let rows = vec![
            row(&["sku", "nombre", "categoria", "unidad", "contenido", "precio", "stock"]),
            row(&["", "Sin código", "", "", "", "", ""]),
            row(&["LAP-001", "Lápiz HB", "Escritura", "Unidad", "0", "3,55", "40"]),
        ];
        let products = products_from_rows(rows);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].sku, "LAP-001");
        assert_eq!(products[0].price.cents(), 355);
        assert_eq!(products[0].stock, 40.0);
    }

    #[test]
    fn test_malformed_numbers_default_to_zero() {
        let p = product_from_row(&row(&["X-1", "Goma", "", "Unidad", "abc", "", "-3"])).unwrap();
        assert_eq!(p.content, 0.0);
        assert_eq!(p.price.cents(), 0);
        // clamped when the ledger normalizes it
        assert_eq!(p.normalized().stock, 0.0);
    }

    #[test]
    fn test_short_rows() {
        let p = product_from_row(&row(&["X-2", "Clip"])).unwrap();
        assert_eq!(p.unit, "");
        assert_eq!(p.stock, 0.0);
    }

    #[test]
    fn test_rows_from_delimited() {
        let rows = rows_from_delimited("sku;nombre\nA;Uno\n\nB;Dos\n", ';');
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2], row(&["B", "Dos"]));
    }
}
