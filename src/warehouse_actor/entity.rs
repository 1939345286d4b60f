use crate::actor_framework::Entity;
use crate::domain::{ProductId, Warehouse, WarehouseCreate, WarehouseId, WarehouseProduct, WarehouseUpdate};

use super::actions::{InventoryLevels, ViolationReason, WarehouseAction, WarehouseActionResult};

impl Entity for Warehouse {
    type Id = WarehouseId;
    type CreateParams = WarehouseCreate;
    type UpdateParams = WarehouseUpdate;
    type Action = WarehouseAction;
    type ActionResult = WarehouseActionResult;

    fn id(&self) -> &WarehouseId {
        &self.id
    }

    fn from_create_params(id: WarehouseId, params: WarehouseCreate) -> Result<Self, String> {
        if params.name.trim().is_empty() {
            return Err("Warehouse name must not be empty".to_string());
        }
        let products = params
            .products
            .into_iter()
            .map(|listing| (listing.product_id.clone(), listing))
            .collect();
        Ok(Self {
            id,
            name: params.name,
            contact_email: params.contact_email,
            forward_orders_using: params.forward_orders_using,
            products,
        })
    }

    /// Applies catalog maintenance: renames, new or repriced listings and removals.
    fn on_update(&mut self, update: WarehouseUpdate) -> Result<(), String> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.contact_email {
            self.contact_email = Some(email);
        }
        for listing in update.upsert_products {
            match self.products.get_mut(&listing.product_id) {
                Some(existing) => existing.reprice(listing),
                None => {
                    self.products.insert(listing.product_id.clone(), listing);
                }
            }
        }
        for product_id in &update.remove_products {
            self.products.remove(product_id);
        }
        Ok(())
    }

    fn handle_action(&mut self, action: WarehouseAction) -> Result<WarehouseActionResult, String> {
        if action.count() == 0 {
            return Ok(WarehouseActionResult::Violation(ViolationReason::ZeroCount));
        }
        let result = match action {
            WarehouseAction::DecreaseAvailable { product_id, count } => {
                self.adjust(&product_id, |listing| {
                    listing.count = listing
                        .count
                        .checked_sub(count)
                        .ok_or(ViolationReason::AvailableBelowZero { available: listing.count })?;
                    Ok(())
                })
            }
            WarehouseAction::Restock { product_id, count, pricing } => {
                match self.products.get_mut(&product_id) {
                    Some(listing) => {
                        listing.count = listing.count.saturating_add(count);
                        WarehouseActionResult::Adjusted(levels(listing))
                    }
                    None => {
                        let listing = WarehouseProduct::from_restock(product_id.clone(), count, &pricing);
                        let result = WarehouseActionResult::Adjusted(levels(&listing));
                        self.products.insert(product_id, listing);
                        result
                    }
                }
            }
            WarehouseAction::IncreaseSold { product_id, count } => self.adjust(&product_id, |listing| {
                listing.sold_count = listing.sold_count.saturating_add(count);
                Ok(())
            }),
            WarehouseAction::DecreaseSold { product_id, count } => self.adjust(&product_id, |listing| {
                listing.sold_count = listing
                    .sold_count
                    .checked_sub(count)
                    .ok_or(ViolationReason::SoldBelowZero { sold: listing.sold_count })?;
                Ok(())
            }),
        };
        Ok(result)
    }

    fn is_mutation(result: &WarehouseActionResult) -> bool {
        matches!(result, WarehouseActionResult::Adjusted(_))
    }
}

impl Warehouse {
    fn adjust(
        &mut self,
        product_id: &ProductId,
        apply: impl FnOnce(&mut WarehouseProduct) -> Result<(), ViolationReason>,
    ) -> WarehouseActionResult {
        let Some(listing) = self.products.get_mut(product_id) else {
            return WarehouseActionResult::Violation(ViolationReason::NotStocked);
        };
        match apply(listing) {
            Ok(()) => WarehouseActionResult::Adjusted(levels(listing)),
            Err(reason) => WarehouseActionResult::Violation(reason),
        }
    }
}

fn levels(listing: &WarehouseProduct) -> InventoryLevels {
    InventoryLevels {
        available: listing.count,
        sold: listing.sold_count,
    }
}
