use crate::models::LineItem;

pub fn line_amount(quantity: u32, unit_price: f64) -> f64 {
    f64::from(quantity) * unit_price
}

/// Sum of `quantity * unit_price` over all line items.
pub fn total(line_items: &[LineItem]) -> f64 {
    line_items.iter().map(LineItem::amount).sum()
}

pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub fn format_amount(amount: f64) -> String {
    format!("${:.2}", round_to_cents(amount))
}
