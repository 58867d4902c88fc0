//! Stock records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{InventoryId, ProductId, StockLevel};

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct InventoryRow {
    pub id: InventoryId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub reserved: i32,
    pub updated_at: DateTime<Utc>,
}

/// Inventory with the derived `available` count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub reserved: i32,
    pub available: i32,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    #[must_use]
    pub const fn stock(&self) -> StockLevel {
        StockLevel::new(self.quantity, self.reserved)
    }
}

impl From<InventoryRow> for Inventory {
    fn from(row: InventoryRow) -> Self {
        let stock = StockLevel::new(row.quantity, row.reserved);
        Self {
            id: row.id,
            product_id: row.product_id,
            quantity: row.quantity,
            reserved: row.reserved,
            available: stock.available(),
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInventoryRequest {
    pub quantity: i32,
}
