use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{ForwardOrdersMethod, Product, ProductId, WarehouseId};

/// A priced catalog listing together with its inventory counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseProduct {
    pub product_id: ProductId,
    /// Units available for sale.
    pub count: u32,
    pub sold_count: u32,
    pub price: f64,
    /// Price before discounts.
    pub initial_price: f64,
    pub delivery_time_min: Option<u32>,
    pub delivery_time_max: Option<u32>,
    pub is_manufacturing: bool,
    pub is_carrier_required: bool,
    pub is_delivery_required: bool,
    pub is_takeaway: bool,
}

impl WarehouseProduct {
    pub fn new(product_id: impl Into<ProductId>, count: u32, price: f64) -> Self {
        Self {
            product_id: product_id.into(),
            count,
            sold_count: 0,
            price,
            initial_price: price,
            delivery_time_min: None,
            delivery_time_max: None,
            is_manufacturing: false,
            is_carrier_required: true,
            is_delivery_required: true,
            is_takeaway: false,
        }
    }

    pub fn with_initial_price(mut self, initial_price: f64) -> Self {
        self.initial_price = initial_price;
        self
    }

    pub fn with_delivery_time(mut self, min: u32, max: u32) -> Self {
        self.delivery_time_min = Some(min);
        self.delivery_time_max = Some(max);
        self
    }

    pub fn takeaway(mut self) -> Self {
        self.is_takeaway = true;
        self.is_delivery_required = false;
        self.is_carrier_required = false;
        self
    }

    /// Takes pricing, delivery bounds and flags from `listing`, keeping the counters.
    pub fn reprice(&mut self, listing: WarehouseProduct) {
        let (count, sold_count) = (self.count, self.sold_count);
        *self = WarehouseProduct { count, sold_count, ..listing };
    }

    /// Rebuild a listing from restored pricing after it left the catalog.
    pub fn from_restock(product_id: ProductId, count: u32, pricing: &RestockPricing) -> Self {
        Self {
            product_id,
            count,
            sold_count: 0,
            price: pricing.price,
            initial_price: pricing.initial_price,
            delivery_time_min: pricing.delivery_time_min,
            delivery_time_max: pricing.delivery_time_max,
            is_manufacturing: false,
            is_carrier_required: true,
            is_delivery_required: true,
            is_takeaway: false,
        }
    }
}

/// Price fields carried back to the warehouse when an order is cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestockPricing {
    pub price: f64,
    pub initial_price: f64,
    pub delivery_time_min: Option<u32>,
    pub delivery_time_max: Option<u32>,
}

/// A selling location with its own catalog and inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub contact_email: Option<String>,
    pub forward_orders_using: Vec<ForwardOrdersMethod>,
    pub products: HashMap<ProductId, WarehouseProduct>,
}

impl Warehouse {
    pub fn product(&self, product_id: &ProductId) -> Option<&WarehouseProduct> {
        self.products.get(product_id)
    }

    pub fn forwards_orders_by(&self, method: ForwardOrdersMethod) -> bool {
        self.forward_orders_using.contains(&method)
    }

    pub fn summary(&self) -> WarehouseSummary {
        WarehouseSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            contact_email: self.contact_email.clone(),
        }
    }
}

/// Warehouse reference data joined onto order listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarehouseSummary {
    pub id: WarehouseId,
    pub name: String,
    pub contact_email: Option<String>,
}

/// Payload for creating a new warehouse.
#[derive(Debug, Clone)]
pub struct WarehouseCreate {
    pub name: String,
    pub contact_email: Option<String>,
    pub forward_orders_using: Vec<ForwardOrdersMethod>,
    pub products: Vec<WarehouseProduct>,
}

impl WarehouseCreate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact_email: None,
            forward_orders_using: Vec::new(),
            products: Vec::new(),
        }
    }

    pub fn with_contact_email(mut self, email: impl Into<String>) -> Self {
        self.contact_email = Some(email.into());
        self
    }

    pub fn forwarding_orders_by(mut self, method: ForwardOrdersMethod) -> Self {
        self.forward_orders_using.push(method);
        self
    }

    pub fn with_product(mut self, product: WarehouseProduct) -> Self {
        self.products.push(product);
        self
    }
}

/// Catalog maintenance. Inventory counters move only through warehouse actions:
/// upserting an existing listing keeps its counts.
#[derive(Debug, Clone, Default)]
pub struct WarehouseUpdate {
    pub name: Option<String>,
    pub contact_email: Option<String>,
    pub upsert_products: Vec<WarehouseProduct>,
    pub remove_products: Vec<ProductId>,
}

/// A catalog listing resolved together with its product definition.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub product: Product,
    pub listing: WarehouseProduct,
}

/// A warehouse with its full catalog, keyed by product id.
#[derive(Debug, Clone)]
pub struct WarehouseCatalog {
    pub warehouse: Warehouse,
    pub entries: HashMap<ProductId, CatalogEntry>,
}

impl WarehouseCatalog {
    pub fn entry(&self, product_id: &ProductId) -> Option<&CatalogEntry> {
        self.entries.get(product_id)
    }
}
