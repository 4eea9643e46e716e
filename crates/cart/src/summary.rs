//! Display snapshot of a cart, handed to presentation code.
//!
//! Amounts stay in minor units; currency formatting belongs to the caller.

use serde::{Deserialize, Serialize};

use storefront_catalog::{Money, ProductId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: u64,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSummary {
    pub lines: Vec<SummaryLine>,
    pub item_count: u64,
    pub subtotal: Money,
    pub open: bool,
}

impl CartSummary {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
