use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{ProductId, WarehouseId};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;
use crate::warehouse_actor::{ViolationReason, WarehouseError};

/// The kind of entity a missing reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceKind {
    User,
    Warehouse,
    Product,
    Order,
}

impl Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::User => "User",
            ReferenceKind::Warehouse => "Warehouse",
            ReferenceKind::Product => "Product",
            ReferenceKind::Order => "Order",
        };
        f.write_str(name)
    }
}

/// Errors surfaced by the order lifecycle operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderLifecycleError {
    #[error("{kind} not found: {id}")]
    ReferenceNotFound { kind: ReferenceKind, id: String },
    #[error("Product {product_id} is not sold by warehouse {warehouse_id}")]
    ProductNotInWarehouse {
        warehouse_id: WarehouseId,
        product_id: ProductId,
    },
    #[error("Insufficient stock of {product_id} in {warehouse_id}: requested {requested}, available {available}")]
    InsufficientStock {
        warehouse_id: WarehouseId,
        product_id: ProductId,
        requested: u32,
        available: u32,
    },
    #[error("Inventory violation on {product_id} in {warehouse_id} ({action} by {count}): {reason}")]
    InventoryViolation {
        warehouse_id: WarehouseId,
        product_id: ProductId,
        action: &'static str,
        count: u32,
        reason: ViolationReason,
    },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

impl OrderLifecycleError {
    pub fn not_found(kind: ReferenceKind, id: impl Display) -> Self {
        OrderLifecycleError::ReferenceNotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<UserError> for OrderLifecycleError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => Self::not_found(ReferenceKind::User, id),
            other => OrderLifecycleError::Collaborator(other.to_string()),
        }
    }
}

impl From<ProductError> for OrderLifecycleError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(id) => Self::not_found(ReferenceKind::Product, id),
            other => OrderLifecycleError::Collaborator(other.to_string()),
        }
    }
}

impl From<WarehouseError> for OrderLifecycleError {
    fn from(e: WarehouseError) -> Self {
        match e {
            WarehouseError::NotFound(id) => Self::not_found(ReferenceKind::Warehouse, id),
            other => OrderLifecycleError::Collaborator(other.to_string()),
        }
    }
}

impl From<OrderError> for OrderLifecycleError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => Self::not_found(ReferenceKind::Order, id),
            other => OrderLifecycleError::Collaborator(other.to_string()),
        }
    }
}
