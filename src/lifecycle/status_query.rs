//! Operational buckets over the two order status axes.
//!
//! The bucket table lives in [`OrderFilter::classify`] and nowhere else. Every
//! filter is scoped to one warehouse and skips soft-deleted orders.

use std::convert::Infallible;
use std::ops::{Bound, RangeBounds};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::actor_framework::Query;
use crate::domain::{CarrierStatus, Order, WarehouseId, WarehouseStatus};

/// Warehouse status ordinals an order must fall in to be offered to carriers.
const CARRIER_PICKUP_WAREHOUSE_STATUS: (Bound<u16>, Bound<u16>) = (Bound::Included(2), Bound::Excluded(200));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    Confirmed,
    InDelivery,
    NotConfirmed,
    NotPaid,
    Cancelled,
    Relevant,
    /// Any unrecognised bucket name: no status constraint.
    #[default]
    All,
}

impl StatusBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusBucket::Confirmed => "confirmed",
            StatusBucket::InDelivery => "in_delivery",
            StatusBucket::NotConfirmed => "not_confirmed",
            StatusBucket::NotPaid => "not_paid",
            StatusBucket::Cancelled => "cancelled",
            StatusBucket::Relevant => "relevant",
            StatusBucket::All => "all",
        }
    }
}

impl FromStr for StatusBucket {
    type Err = Infallible;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "confirmed" => StatusBucket::Confirmed,
            "in_delivery" => StatusBucket::InDelivery,
            "not_confirmed" => StatusBucket::NotConfirmed,
            "not_paid" => StatusBucket::NotPaid,
            "cancelled" => StatusBucket::Cancelled,
            "relevant" => StatusBucket::Relevant,
            _ => StatusBucket::All,
        })
    }
}

/// A compiled predicate over orders of one warehouse.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFilter {
    pub warehouse_id: WarehouseId,
    /// Bounds on the warehouse status ordinal.
    pub warehouse_status: (Bound<u16>, Bound<u16>),
    /// Bounds on the carrier status ordinal.
    pub carrier_status: (Bound<u16>, Bound<u16>),
    pub is_cancelled: Option<bool>,
    pub is_paid: Option<bool>,
    pub require_no_carrier: bool,
    pub exclude_completed: bool,
}

impl OrderFilter {
    /// Every non-deleted order of the warehouse.
    pub fn for_warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id,
            warehouse_status: (Bound::Unbounded, Bound::Unbounded),
            carrier_status: (Bound::Unbounded, Bound::Unbounded),
            is_cancelled: None,
            is_paid: None,
            require_no_carrier: false,
            exclude_completed: false,
        }
    }

    pub fn classify(bucket: StatusBucket, warehouse_id: WarehouseId) -> Self {
        use Bound::{Excluded, Included, Unbounded};
        use CarrierStatus as Cs;
        use WarehouseStatus as Ws;

        let base = Self::for_warehouse(warehouse_id);
        match bucket {
            StatusBucket::Confirmed => Self {
                warehouse_status: (Excluded(Ws::NoStatus.ordinal()), Excluded(Ws::GivenToCustomer.ordinal())),
                carrier_status: (Unbounded, Included(Cs::CarrierSelectedOrder.ordinal())),
                is_cancelled: Some(false),
                ..base
            },
            StatusBucket::InDelivery => Self {
                warehouse_status: (Unbounded, Excluded(Ws::AllocationFailed.ordinal())),
                carrier_status: (
                    Included(Cs::CarrierPickedUpOrder.ordinal()),
                    Excluded(Cs::DeliveryCompleted.ordinal()),
                ),
                is_cancelled: Some(false),
                ..base
            },
            StatusBucket::NotConfirmed => Self {
                warehouse_status: (Included(Ws::NoStatus.ordinal()), Included(Ws::NoStatus.ordinal())),
                is_cancelled: Some(false),
                ..base
            },
            StatusBucket::NotPaid => Self {
                is_paid: Some(false),
                ..base
            },
            StatusBucket::Cancelled => Self {
                is_cancelled: Some(true),
                ..base
            },
            StatusBucket::Relevant => Self {
                warehouse_status: (Included(Ws::NoStatus.ordinal()), Excluded(Ws::GivenToCustomer.ordinal())),
                carrier_status: (Unbounded, Included(Cs::CarrierSelectedOrder.ordinal())),
                is_cancelled: Some(false),
                ..base
            },
            StatusBucket::All => base,
        }
    }

    /// Orders a carrier may pick up: unassigned, in processing, and not completed.
    pub fn available_to_carrier(warehouse_id: WarehouseId) -> Self {
        let no_carrier = CarrierStatus::NoCarrier.ordinal();
        Self {
            warehouse_status: CARRIER_PICKUP_WAREHOUSE_STATUS,
            carrier_status: (Bound::Included(no_carrier), Bound::Included(no_carrier)),
            require_no_carrier: true,
            exclude_completed: true,
            ..Self::for_warehouse(warehouse_id)
        }
    }

    pub fn matches(&self, order: &Order) -> bool {
        order.warehouse_id == self.warehouse_id
            && !order.is_deleted
            && self.warehouse_status.contains(&order.warehouse_status.ordinal())
            && self.carrier_status.contains(&order.carrier_status.ordinal())
            && self.is_cancelled.map_or(true, |cancelled| order.is_cancelled == cancelled)
            && self.is_paid.map_or(true, |paid| order.is_paid == paid)
            && (!self.require_no_carrier || order.carrier_id.is_none())
            && (!self.exclude_completed || !is_completed(order))
    }

    pub fn into_query(self) -> Query<Order> {
        Query::all().filter(move |order: &Order| self.matches(order))
    }
}

/// Cancelled, delivered, or handed to the customer at the counter.
pub fn is_completed(order: &Order) -> bool {
    order.is_cancelled
        || order.carrier_status >= CarrierStatus::DeliveryCompleted
        || order.warehouse_status == WarehouseStatus::GivenToCustomer
}
