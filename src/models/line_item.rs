use serde::{Deserialize, Serialize};

use crate::totals;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// 1-based position within the parent document.
    #[serde(default)]
    pub id: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub unit_price: f64,
}

impl LineItem {
    pub fn amount(&self) -> f64 {
        totals::line_amount(self.quantity, self.unit_price)
    }
}
