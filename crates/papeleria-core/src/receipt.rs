//! # Receipt Rendering
//!
//! Plain-text receipt for a committed sale.
//!
//! ```text
//! Ticket: 3f9a1c02
//! Fecha: 2025-03-14 16:05
//! ----------------------------------------
//! Lápiz HB                2.000 x   3.55 =    7.10
//! ----------------------------------------
//! TOTAL:    7.00
//! EFECTIVO: 10.00
//! CAMBIO:   3.00
//! ```

use std::fmt::Write;

use crate::money::Money;
use crate::types::Sale;

const RULE: &str = "----------------------------------------";

/// File name a receipt is stored under.
pub fn receipt_file_name(sale_id: &str) -> String {
    format!("ticket-{}.txt", sale_id)
}

/// Renders the receipt text.
///
/// Change is printed cash-rounded to `step_cents` and never negative.
pub fn render_receipt(sale: &Sale, step_cents: i64) -> String {
    let mut out = String::new();
    // writing to a String cannot fail
    let _ = writeln!(out, "Ticket: {}", sale.id);
    let _ = writeln!(out, "Fecha: {}", sale.timestamp.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "{}", RULE);

    for item in sale.items() {
        let _ = writeln!(
            out,
            "{:<22} {:>6.3} x {:>6.2} = {:>7.2}",
            item.name, item.quantity, item.unit_price, item.subtotal
        );
    }
    let _ = writeln!(out, "{}", RULE);

    let change_due = (sale.cash_tendered() - sale.total()).non_negative();
    let change = Money::cash_round(change_due.to_decimal(), step_cents);

    let _ = writeln!(out, "TOTAL:    {}", sale.total().grouped());
    let _ = writeln!(out, "EFECTIVO: {}", sale.cash_tendered().grouped());
    let _ = writeln!(out, "CAMBIO:   {}", change.grouped());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::CASH_STEP_CENTS;
    use crate::types::SaleItem;
    use chrono::NaiveDate;

    fn sale() -> Sale {
        let mut sale = Sale::new("3f9a1c02");
        sale.timestamp = NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(16, 5, 42))
            .unwrap();
        sale.add_item(SaleItem::new("LAP-001", "Lápiz HB", 2.0, 3.55));
        sale.set_total(Money::from_cents(700));
        sale.set_cash_tendered(Money::from_cents(100000));
        sale
    }

    #[test]
    fn test_receipt_layout() {
        let text = render_receipt(&sale(), CASH_STEP_CENTS);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Ticket: 3f9a1c02");
        assert_eq!(lines[1], "Fecha: 2025-03-14 16:05");
        assert_eq!(lines[2].len(), 40);
        assert_eq!(lines[3], "Lápiz HB                2.000 x   3.55 =    7.10");
        assert_eq!(lines[5], "TOTAL:    7.00");
        assert_eq!(lines[6], "EFECTIVO: 1,000.00");
        assert_eq!(lines[7], "CAMBIO:   993.00");
    }

    #[test]
    fn test_change_never_negative() {
        let mut s = sale();
        s.set_cash_tendered(Money::from_cents(500));
        let text = render_receipt(&s, CASH_STEP_CENTS);
        assert!(text.contains("CAMBIO:   0.00"));
    }

    #[test]
    fn test_file_name() {
        assert_eq!(receipt_file_name("ab12cd34"), "ticket-ab12cd34.txt");
    }
}
