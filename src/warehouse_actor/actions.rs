use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::domain::{ProductId, RestockPricing};

/// Inventory adjustments applied atomically to a single catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarehouseAction {
    /// Reserve units when an order is placed.
    DecreaseAvailable { product_id: ProductId, count: u32 },
    /// Return units to stock. Re-creates the entry from `pricing` when it was
    /// removed from the catalog in the meantime.
    Restock {
        product_id: ProductId,
        count: u32,
        pricing: RestockPricing,
    },
    IncreaseSold { product_id: ProductId, count: u32 },
    DecreaseSold { product_id: ProductId, count: u32 },
}

impl WarehouseAction {
    pub fn product_id(&self) -> &ProductId {
        match self {
            WarehouseAction::DecreaseAvailable { product_id, .. }
            | WarehouseAction::Restock { product_id, .. }
            | WarehouseAction::IncreaseSold { product_id, .. }
            | WarehouseAction::DecreaseSold { product_id, .. } => product_id,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            WarehouseAction::DecreaseAvailable { count, .. }
            | WarehouseAction::Restock { count, .. }
            | WarehouseAction::IncreaseSold { count, .. }
            | WarehouseAction::DecreaseSold { count, .. } => *count,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            WarehouseAction::DecreaseAvailable { .. } => "decrease_available",
            WarehouseAction::Restock { .. } => "restock",
            WarehouseAction::IncreaseSold { .. } => "increase_sold",
            WarehouseAction::DecreaseSold { .. } => "decrease_sold",
        }
    }
}

/// Counters of one catalog entry after an adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevels {
    pub available: u32,
    pub sold: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationReason {
    /// The warehouse does not list the product.
    NotStocked,
    ZeroCount,
    AvailableBelowZero { available: u32 },
    SoldBelowZero { sold: u32 },
}

impl Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::NotStocked => write!(f, "product is not stocked by the warehouse"),
            ViolationReason::ZeroCount => write!(f, "adjustment count must be positive"),
            ViolationReason::AvailableBelowZero { available } => {
                write!(f, "only {} units available", available)
            }
            ViolationReason::SoldBelowZero { sold } => write!(f, "only {} units sold", sold),
        }
    }
}

/// Outcome of a [`WarehouseAction`].
///
/// A violation leaves the warehouse untouched; it is reported as a value rather
/// than an error so the caller can log it with its own context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WarehouseActionResult {
    Adjusted(InventoryLevels),
    Violation(ViolationReason),
}
