use tracing::{error, info};

use crate::domain::{ProductId, RestockPricing, WarehouseId};
use crate::warehouse_actor::WarehouseAction;

use super::inventory::InventoryAdjustmentCoordinator;

/// An inventory adjustment that was applied and can be undone.
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryStep {
    DecreasedAvailable {
        product_id: ProductId,
        count: u32,
        pricing: RestockPricing,
    },
    IncreasedSold { product_id: ProductId, count: u32 },
}

impl InventoryStep {
    fn inverse(&self) -> WarehouseAction {
        match self {
            InventoryStep::DecreasedAvailable { product_id, count, pricing } => WarehouseAction::Restock {
                product_id: product_id.clone(),
                count: *count,
                pricing: pricing.clone(),
            },
            InventoryStep::IncreasedSold { product_id, count } => WarehouseAction::DecreaseSold {
                product_id: product_id.clone(),
                count: *count,
            },
        }
    }
}

/// Records the adjustments made on behalf of one order so a partial failure
/// can be rolled back.
#[derive(Debug)]
pub struct AdjustmentJournal {
    warehouse_id: WarehouseId,
    steps: Vec<InventoryStep>,
}

impl AdjustmentJournal {
    pub fn new(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id,
            steps: Vec::new(),
        }
    }

    pub fn record(&mut self, step: InventoryStep) {
        self.steps.push(step);
    }

    pub fn steps(&self) -> &[InventoryStep] {
        &self.steps
    }

    /// Replays the inverse of every recorded step, newest first.
    ///
    /// Best effort: a failing inverse is logged and the rest still run. Returns
    /// the number of steps that could not be undone.
    pub async fn roll_back(self, inventory: &InventoryAdjustmentCoordinator) -> usize {
        let mut failed = 0;
        for step in self.steps.iter().rev() {
            if let Err(e) = inventory.apply(&self.warehouse_id, step.inverse()).await {
                error!(warehouse_id = %self.warehouse_id, ?step, error = %e, "Failed to undo inventory step");
                failed += 1;
            }
        }
        info!(
            warehouse_id = %self.warehouse_id,
            undone = self.steps.len() - failed,
            failed,
            "Inventory rollback finished"
        );
        failed
    }
}
