use tracing::{debug, error, instrument};

use crate::clients::WarehouseClient;
use crate::domain::{ProductId, RestockPricing, WarehouseId};
use crate::warehouse_actor::{InventoryLevels, WarehouseAction, WarehouseActionResult};

use super::error::OrderLifecycleError;

/// Applies count and sold-count deltas to warehouse inventory entries.
///
/// Knows nothing about orders. Each adjustment is a single warehouse action, so
/// it is atomic per entry.
#[derive(Clone)]
pub struct InventoryAdjustmentCoordinator {
    warehouses: WarehouseClient,
}

impl InventoryAdjustmentCoordinator {
    pub fn new(warehouses: WarehouseClient) -> Self {
        Self { warehouses }
    }

    pub async fn decrease_available(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
        count: u32,
    ) -> Result<InventoryLevels, OrderLifecycleError> {
        let product_id = product_id.clone();
        self.apply(warehouse_id, WarehouseAction::DecreaseAvailable { product_id, count })
            .await
    }

    /// Returns units to stock, re-creating the entry from `pricing` if needed.
    pub async fn add(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
        count: u32,
        pricing: RestockPricing,
    ) -> Result<InventoryLevels, OrderLifecycleError> {
        let product_id = product_id.clone();
        self.apply(warehouse_id, WarehouseAction::Restock { product_id, count, pricing })
            .await
    }

    pub async fn increase_sold_count(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
        count: u32,
    ) -> Result<InventoryLevels, OrderLifecycleError> {
        let product_id = product_id.clone();
        self.apply(warehouse_id, WarehouseAction::IncreaseSold { product_id, count })
            .await
    }

    pub async fn decrease_sold_count(
        &self,
        warehouse_id: &WarehouseId,
        product_id: &ProductId,
        count: u32,
    ) -> Result<InventoryLevels, OrderLifecycleError> {
        let product_id = product_id.clone();
        self.apply(warehouse_id, WarehouseAction::DecreaseSold { product_id, count })
            .await
    }

    #[instrument(skip(self, action), fields(action = action.name(), product_id = %action.product_id(), count = action.count()))]
    pub(crate) async fn apply(
        &self,
        warehouse_id: &WarehouseId,
        action: WarehouseAction,
    ) -> Result<InventoryLevels, OrderLifecycleError> {
        let name = action.name();
        let product_id = action.product_id().clone();
        let count = action.count();
        if count == 0 {
            return Err(OrderLifecycleError::InvalidRequest(format!(
                "{} of {} needs a positive count",
                name, product_id
            )));
        }

        match self.warehouses.adjust_inventory(warehouse_id.clone(), action).await? {
            WarehouseActionResult::Adjusted(levels) => {
                debug!(available = levels.available, sold = levels.sold, "Inventory adjusted");
                Ok(levels)
            }
            WarehouseActionResult::Violation(reason) => {
                error!(
                    %warehouse_id,
                    %product_id,
                    delta = count,
                    action = name,
                    %reason,
                    "Inventory consistency violation"
                );
                Err(OrderLifecycleError::InventoryViolation {
                    warehouse_id: warehouse_id.clone(),
                    product_id,
                    action: name,
                    count,
                    reason,
                })
            }
        }
    }
}
