use serde::{Deserialize, Serialize};

use crate::domain::{CarrierId, CarrierStatus, Order, WarehouseStatus};

/// Status transitions of an order.
///
/// Everything except [`OrderAction::SoftDelete`] is refused once the order is
/// cancelled, and neither status axis moves backwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderAction {
    Confirm,
    AdvanceWarehouseStatus(WarehouseStatus),
    AdvanceCarrierStatus(CarrierStatus),
    AssignCarrier(CarrierId),
    MarkPaid,
    /// Conditional cancel: only an order that is not cancelled yet is touched.
    Cancel,
    SoftDelete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrderActionResult {
    Updated(Order),
    /// The order already was in the requested state.
    Unchanged(Order),
    Cancelled(Order),
    AlreadyCancelled,
}
