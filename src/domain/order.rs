use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    CarrierId, CarrierStatus, CatalogEntry, OrderId, OrderType, Product, ProductId, RestockPricing,
    UserId, WarehouseId, WarehouseStatus,
};

/// One ordered product, copied from the warehouse catalog when the order is created.
///
/// Line items never change afterwards, so historical orders keep the price that
/// was paid even when the catalog is repriced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub product: Product,
    pub count: u32,
    pub price: f64,
    pub initial_price: f64,
    pub delivery_time_min: Option<u32>,
    pub delivery_time_max: Option<u32>,
    pub is_manufacturing: bool,
    pub is_carrier_required: bool,
    pub is_delivery_required: bool,
    pub is_takeaway: bool,
}

impl OrderLineItem {
    pub fn snapshot(entry: &CatalogEntry, count: u32) -> Self {
        let listing = &entry.listing;
        Self {
            product: entry.product.clone(),
            count,
            price: listing.price,
            initial_price: listing.initial_price,
            delivery_time_min: listing.delivery_time_min,
            delivery_time_max: listing.delivery_time_max,
            is_manufacturing: listing.is_manufacturing,
            is_carrier_required: listing.is_carrier_required,
            is_delivery_required: listing.is_delivery_required,
            is_takeaway: listing.is_takeaway,
        }
    }

    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }

    pub fn restock_pricing(&self) -> RestockPricing {
        RestockPricing {
            price: self.price,
            initial_price: self.initial_price,
            delivery_time_min: self.delivery_time_min,
            delivery_time_max: self.delivery_time_max,
        }
    }
}

/// Represents a customer order placed against one warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub warehouse_id: WarehouseId,
    /// Absent while no customer is attached yet.
    pub user_id: Option<UserId>,
    pub carrier_id: Option<CarrierId>,
    /// Per warehouse, per day, 1-based.
    pub order_number: u32,
    pub products: Vec<OrderLineItem>,
    pub warehouse_status: WarehouseStatus,
    pub carrier_status: CarrierStatus,
    pub is_confirmed: bool,
    pub is_cancelled: bool,
    pub is_paid: bool,
    pub is_deleted: bool,
    pub delivery_notes: Option<String>,
    pub order_type: OrderType,
    pub created_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn total_price(&self) -> f64 {
        self.products
            .iter()
            .map(|line| line.price * f64::from(line.count))
            .sum()
    }
}

/// Payload for persisting a new order.
#[derive(Debug, Clone)]
pub struct OrderCreate {
    pub warehouse_id: WarehouseId,
    pub user_id: Option<UserId>,
    pub order_number: u32,
    pub products: Vec<OrderLineItem>,
    pub order_type: OrderType,
    pub is_confirmed: bool,
    pub delivery_notes: Option<String>,
}
