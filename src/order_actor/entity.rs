use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{CarrierStatus, Order, OrderCreate, OrderId, WarehouseStatus};

use super::actions::{OrderAction, OrderActionResult};

impl Entity for Order {
    type Id = OrderId;
    type CreateParams = OrderCreate;
    type UpdateParams = Option<String>; // Delivery notes
    type Action = OrderAction;
    type ActionResult = OrderActionResult;

    fn id(&self) -> &OrderId {
        &self.id
    }

    /// Creates a new Order from creation parameters.
    ///
    /// # Notes
    /// The order starts with no warehouse or carrier status, unpaid and not cancelled.
    fn from_create_params(id: OrderId, params: OrderCreate) -> Result<Self, String> {
        if params.products.is_empty() {
            return Err("Order must contain at least one product".to_string());
        }
        if params.order_number == 0 {
            return Err("Order numbers start at 1".to_string());
        }
        Ok(Self {
            id,
            warehouse_id: params.warehouse_id,
            user_id: params.user_id,
            carrier_id: None,
            order_number: params.order_number,
            products: params.products,
            warehouse_status: WarehouseStatus::NoStatus,
            carrier_status: CarrierStatus::NoCarrier,
            is_confirmed: params.is_confirmed,
            is_cancelled: false,
            is_paid: false,
            is_deleted: false,
            delivery_notes: params.delivery_notes,
            order_type: params.order_type,
            created_at: Utc::now(),
            cancelled_at: None,
        })
    }

    /// Replaces the delivery notes. Line items are immutable.
    fn on_update(&mut self, delivery_notes: Option<String>) -> Result<(), String> {
        self.delivery_notes = delivery_notes;
        Ok(())
    }

    fn handle_action(&mut self, action: OrderAction) -> Result<OrderActionResult, String> {
        match action {
            OrderAction::Cancel => {
                if self.is_cancelled {
                    return Ok(OrderActionResult::AlreadyCancelled);
                }
                self.is_cancelled = true;
                self.cancelled_at = Some(Utc::now());
                Ok(OrderActionResult::Cancelled(self.clone()))
            }
            OrderAction::SoftDelete => {
                if self.is_deleted {
                    return Ok(OrderActionResult::Unchanged(self.clone()));
                }
                self.is_deleted = true;
                Ok(OrderActionResult::Updated(self.clone()))
            }
            _ if self.is_cancelled => Err(format!("Order {} is cancelled", self.id)),
            OrderAction::Confirm => {
                let changed = !self.is_confirmed;
                self.is_confirmed = true;
                Ok(self.outcome(changed))
            }
            OrderAction::MarkPaid => {
                let changed = !self.is_paid;
                self.is_paid = true;
                Ok(self.outcome(changed))
            }
            OrderAction::AssignCarrier(carrier_id) => {
                let changed = self.carrier_id.as_ref() != Some(&carrier_id);
                self.carrier_id = Some(carrier_id);
                Ok(self.outcome(changed))
            }
            OrderAction::AdvanceWarehouseStatus(status) => {
                if status < self.warehouse_status {
                    return Err(format!(
                        "Warehouse status cannot move back from {:?} to {:?}",
                        self.warehouse_status, status
                    ));
                }
                let changed = status != self.warehouse_status;
                self.warehouse_status = status;
                Ok(self.outcome(changed))
            }
            OrderAction::AdvanceCarrierStatus(status) => {
                if status < self.carrier_status {
                    return Err(format!(
                        "Carrier status cannot move back from {:?} to {:?}",
                        self.carrier_status, status
                    ));
                }
                let changed = status != self.carrier_status;
                self.carrier_status = status;
                Ok(self.outcome(changed))
            }
        }
    }

    fn is_mutation(result: &OrderActionResult) -> bool {
        matches!(result, OrderActionResult::Updated(_) | OrderActionResult::Cancelled(_))
    }
}

impl Order {
    fn outcome(&self, changed: bool) -> OrderActionResult {
        if changed {
            OrderActionResult::Updated(self.clone())
        } else {
            OrderActionResult::Unchanged(self.clone())
        }
    }
}
