//! Ordinal status axes of an order.
//!
//! Both axes are ordered enumerations with stable numeric ordinals. Variants are
//! declared in ascending ordinal order so the derived `Ord` matches the ordinals.

use serde::{Deserialize, Serialize};

/// Store-side fulfillment progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum WarehouseStatus {
    #[default]
    NoStatus = 0,
    ReadyForProcessing = 1,
    WarehouseStartedProcessing = 2,
    AllocationStarted = 3,
    AllocationFinished = 4,
    PackagingStarted = 5,
    PackagingFinished = 6,
    GivenToCarrier = 7,
    AllocationFailed = 200,
    PackagingFailed = 201,
    GivenToCustomer = 202,
}

impl WarehouseStatus {
    pub fn ordinal(self) -> u16 {
        self as u16
    }
}

/// Carrier-side delivery progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(u16)]
pub enum CarrierStatus {
    /// No carrier has selected the order yet.
    #[default]
    NoCarrier = 0,
    CarrierSelectedOrder = 1,
    CarrierPickedUpOrder = 2,
    CarrierStartDelivery = 3,
    CarrierArrivedToCustomer = 4,
    DeliveryCompleted = 5,
    IssuesDuringDelivery = 200,
    ClientRefuseTakingOrder = 201,
}

impl CarrierStatus {
    pub fn ordinal(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    Delivery,
    Takeaway,
}

/// Channels a warehouse wants new orders forwarded through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardOrdersMethod {
    Email,
    Phone,
}
