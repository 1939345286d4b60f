use std::collections::HashMap;

use tracing::{debug, instrument, warn};

use crate::actor_framework::ResourceClient;
use crate::clients::ProductClient;
use crate::domain::{CatalogEntry, Warehouse, WarehouseCatalog, WarehouseCreate, WarehouseId, WarehouseUpdate};
use crate::warehouse_actor::{WarehouseAction, WarehouseActionResult, WarehouseError};

/// Client for interacting with the Warehouse actor.
///
/// Resolves catalog listings against the product store when a full catalog is
/// requested.
#[derive(Clone)]
pub struct WarehouseClient {
    inner: ResourceClient<Warehouse>,
    product_client: ProductClient,
}

impl_client_methods!(WarehouseClient, Warehouse, WarehouseId, WarehouseError, warehouse);

impl WarehouseClient {
    pub fn new(inner: ResourceClient<Warehouse>, product_client: ProductClient) -> Self {
        Self { inner, product_client }
    }

    #[instrument(skip(self))]
    pub async fn create_warehouse(&self, warehouse: WarehouseCreate) -> Result<WarehouseId, WarehouseError> {
        debug!("Sending request");
        let warehouse = self.inner.create(warehouse).await?;
        Ok(warehouse.id)
    }

    #[instrument(skip(self))]
    pub async fn update_warehouse(
        &self,
        id: WarehouseId,
        update: WarehouseUpdate,
    ) -> Result<Warehouse, WarehouseError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }

    /// Loads a warehouse with every catalog listing joined to its product.
    ///
    /// Listings whose product no longer exists are left out of the catalog.
    #[instrument(skip(self))]
    pub async fn get_with_full_catalog(&self, id: WarehouseId) -> Result<Option<WarehouseCatalog>, WarehouseError> {
        let Some(warehouse) = self.get_warehouse(id).await? else {
            return Ok(None);
        };

        let mut entries = HashMap::with_capacity(warehouse.products.len());
        for listing in warehouse.products.values() {
            let product = self
                .product_client
                .get_product(listing.product_id.clone())
                .await
                .map_err(|e| WarehouseError::CatalogResolution(e.to_string()))?;
            match product {
                Some(product) => {
                    entries.insert(
                        listing.product_id.clone(),
                        CatalogEntry {
                            product,
                            listing: listing.clone(),
                        },
                    );
                }
                None => warn!(product_id = %listing.product_id, "Catalog lists an unknown product"),
            }
        }

        Ok(Some(WarehouseCatalog { warehouse, entries }))
    }

    /// Applies one inventory adjustment to a warehouse.
    #[instrument(skip(self))]
    pub async fn adjust_inventory(
        &self,
        id: WarehouseId,
        action: WarehouseAction,
    ) -> Result<WarehouseActionResult, WarehouseError> {
        debug!("Sending request");
        Ok(self.inner.perform_action(id, action).await?)
    }
}
