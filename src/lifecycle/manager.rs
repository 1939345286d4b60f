use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::app_system::SystemConfig;
use crate::clients::{OrderClient, ProductClient, UserClient, WarehouseClient};
use crate::domain::{
    Order, OrderCreate, OrderId, OrderLineItem, OrderType, ProductId, UserId, Warehouse, WarehouseCatalog,
    WarehouseId, WarehouseSummary,
};

use super::compensation::{AdjustmentJournal, InventoryStep};
use super::error::{OrderLifecycleError, ReferenceKind};
use super::existence::ExistenceFilters;
use super::inventory::InventoryAdjustmentCoordinator;
use super::live::{spawn_refetch_loop, LiveOrders};
use super::notifications::{CancellationHook, LogNotifier, NewOrderNotification, NoopCancellationHook, NotificationDispatcher};
use super::paging::{newest_first, PagingOptions};
use super::sequencer::OrderNumberSequencer;
use super::status_query::{OrderFilter, StatusBucket};

/// One requested product of a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: ProductId,
    pub count: u32,
}

impl OrderLineRequest {
    pub fn new(product_id: impl Into<ProductId>, count: u32) -> Self {
        Self {
            product_id: product_id.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Persist the order already confirmed.
    pub auto_confirm: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreateInput {
    pub warehouse_id: WarehouseId,
    /// Orders may be placed before a customer is known.
    pub user_id: Option<UserId>,
    pub products: Vec<OrderLineRequest>,
    #[serde(default)]
    pub order_type: OrderType,
    #[serde(default)]
    pub options: CreateOptions,
    #[serde(default)]
    pub delivery_notes: Option<String>,
}

impl OrderCreateInput {
    pub fn new(warehouse_id: impl Into<WarehouseId>, products: Vec<OrderLineRequest>) -> Self {
        Self {
            warehouse_id: warehouse_id.into(),
            user_id: None,
            products,
            order_type: OrderType::Delivery,
            options: CreateOptions::default(),
            delivery_notes: None,
        }
    }

    pub fn for_user(mut self, user_id: impl Into<UserId>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    pub fn auto_confirmed(mut self) -> Self {
        self.options.auto_confirm = true;
        self
    }

    pub fn with_delivery_notes(mut self, notes: impl Into<String>) -> Self {
        self.delivery_notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetOptions {
    /// Join every order with its warehouse summary.
    pub populate_warehouse: bool,
    /// Carriers are only referenced by `carrier_id`; there is no carrier store
    /// to join against, so listings are the same with or without this flag.
    pub populate_carrier: bool,
}

/// An order as listed for a warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub order: Order,
    pub warehouse: Option<WarehouseSummary>,
}

#[derive(Debug, Clone)]
struct ManagerSettings {
    compensate_partial_failures: bool,
    operations_email: Option<String>,
    live_feed_buffer: usize,
}

/// Creates and cancels orders while keeping warehouse inventory in step, and
/// serves per-warehouse order listings.
#[derive(Clone)]
pub struct OrderLifecycleManager {
    users: UserClient,
    products: ProductClient,
    warehouses: WarehouseClient,
    orders: OrderClient,
    inventory: InventoryAdjustmentCoordinator,
    sequencer: OrderNumberSequencer,
    filters: ExistenceFilters,
    notifier: Arc<dyn NotificationDispatcher>,
    cancellation_hook: Arc<dyn CancellationHook>,
    settings: ManagerSettings,
}

impl OrderLifecycleManager {
    pub fn new(
        users: UserClient,
        products: ProductClient,
        warehouses: WarehouseClient,
        orders: OrderClient,
        config: &SystemConfig,
    ) -> Self {
        Self {
            inventory: InventoryAdjustmentCoordinator::new(warehouses.clone()),
            sequencer: OrderNumberSequencer::new(warehouses.clone(), orders.clone(), config.numbering),
            filters: ExistenceFilters::new(orders.clone(), config.existence_capacity),
            users,
            products,
            warehouses,
            orders,
            notifier: Arc::new(LogNotifier),
            cancellation_hook: Arc::new(NoopCancellationHook),
            settings: ManagerSettings {
                compensate_partial_failures: config.compensate_partial_failures,
                operations_email: config.operations_email.clone(),
                live_feed_buffer: config.live_feed_buffer,
            },
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_cancellation_hook(mut self, hook: Arc<dyn CancellationHook>) -> Self {
        self.cancellation_hook = hook;
        self
    }

    pub fn inventory(&self) -> &InventoryAdjustmentCoordinator {
        &self.inventory
    }

    /// Live listing of a warehouse's orders.
    ///
    /// Emits the current listing right away and again after every burst of
    /// relevant order writes.
    #[instrument(skip(self))]
    pub async fn get(&self, warehouse_id: WarehouseId, options: GetOptions) -> Result<LiveOrders, OrderLifecycleError> {
        self.warehouses.require_warehouse(warehouse_id.clone()).await?;
        if options.populate_carrier {
            debug!(%warehouse_id, "No carrier reference data to join, listing carrier ids only");
        }

        // Subscribe before the first fetch so no write falls in between.
        let filter = self.filters.for_warehouse(&warehouse_id).await;
        let triggers = filter.subscribe();

        let manager = self.clone();
        let (receiver, task) = spawn_refetch_loop(triggers, self.settings.live_feed_buffer, move || {
            let manager = manager.clone();
            let warehouse_id = warehouse_id.clone();
            async move {
                manager
                    .query_orders(&warehouse_id, options.populate_warehouse, false)
                    .await
            }
        });
        Ok(LiveOrders::new(receiver, task, filter))
    }

    /// Places an order and reserves its stock.
    #[instrument(skip(self, input), fields(warehouse_id = %input.warehouse_id, lines = input.products.len()))]
    pub async fn create(&self, input: OrderCreateInput) -> Result<Order, OrderLifecycleError> {
        validate_lines(&input.products)?;

        if let Some(user_id) = &input.user_id {
            self.users.require_user(user_id.clone()).await?;
        }

        let catalog = self
            .warehouses
            .get_with_full_catalog(input.warehouse_id.clone())
            .await?
            .ok_or_else(|| OrderLifecycleError::not_found(ReferenceKind::Warehouse, &input.warehouse_id))?;

        let products = snapshot_lines(&catalog, &input.products)?;
        check_stock(&catalog, &input.products)?;

        let order_number = self.sequencer.reserve(&input.warehouse_id).await?;
        let order = self
            .orders
            .create_order(OrderCreate {
                warehouse_id: input.warehouse_id,
                user_id: input.user_id,
                order_number,
                products,
                order_type: input.order_type,
                is_confirmed: input.options.auto_confirm,
                delivery_notes: input.delivery_notes,
            })
            .await?;
        info!(order_id = %order.id, order_number, total = order.total_price(), "Order persisted");

        let mut journal = AdjustmentJournal::new(order.warehouse_id.clone());
        if let Err(e) = self.reserve_stock(&order, &mut journal).await {
            if self.settings.compensate_partial_failures {
                self.compensate(&order, journal).await;
            } else {
                error!(
                    order_id = %order.id,
                    applied = journal.steps().len(),
                    error = %e,
                    "Order left with partially applied inventory"
                );
            }
            return Err(e);
        }

        self.dispatch_new_order(&order, &catalog.warehouse);
        Ok(order)
    }

    /// Places a one-unit order of a single product for a known customer.
    #[instrument(skip(self))]
    pub async fn create_single_product(
        &self,
        user_id: UserId,
        warehouse_id: WarehouseId,
        product_id: ProductId,
        order_type: OrderType,
    ) -> Result<Order, OrderLifecycleError> {
        self.users.require_user(user_id.clone()).await?;
        self.warehouses.require_warehouse(warehouse_id.clone()).await?;
        self.products.require_product(product_id.clone()).await?;

        self.create(OrderCreateInput {
            warehouse_id,
            user_id: Some(user_id),
            products: vec![OrderLineRequest { product_id, count: 1 }],
            order_type,
            options: CreateOptions::default(),
            delivery_notes: None,
        })
        .await
    }

    /// Cancels an order and puts its stock back.
    ///
    /// Returns `None` when the order was already cancelled, including when a
    /// concurrent cancel got there first.
    #[instrument(skip(self))]
    pub async fn cancel(&self, order_id: OrderId) -> Result<Option<Order>, OrderLifecycleError> {
        let order = self.orders.require_order(order_id.clone()).await?;
        if order.is_cancelled {
            warn!(%order_id, "Order is already cancelled");
            return Ok(None);
        }

        let Some(order) = self.orders.cancel_order(order_id.clone()).await? else {
            warn!(%order_id, "Order was cancelled concurrently");
            return Ok(None);
        };

        if order.is_confirmed {
            self.cancellation_hook.on_confirmed_order_cancelled(&order).await;
        }

        info!(warehouse_id = %order.warehouse_id, lines = order.products.len(), "Returning cancelled products to stock");
        for (restored, line) in order.products.iter().enumerate() {
            if let Err(e) = self.restore_line(&order.warehouse_id, line).await {
                error!(
                    %order_id,
                    product_id = %line.product_id(),
                    unrestored = order.products.len() - restored,
                    error = %e,
                    "Inventory only partially restored"
                );
                return Err(e);
            }
        }

        info!(warehouse_id = %order.warehouse_id, "Cancelled products returned to stock");
        Ok(Some(order))
    }

    /// One page of a warehouse's orders in a status bucket.
    #[instrument(skip(self))]
    pub async fn list_for_warehouse(
        &self,
        warehouse_id: WarehouseId,
        paging: PagingOptions,
        bucket: StatusBucket,
    ) -> Result<Vec<Order>, OrderLifecycleError> {
        let query = paging.apply(OrderFilter::classify(bucket, warehouse_id).into_query());
        Ok(self.orders.query_orders(query).await?)
    }

    /// Orders of the warehouse that a carrier could pick up right now.
    #[instrument(skip(self))]
    pub async fn available_to_carrier(
        &self,
        warehouse_id: WarehouseId,
        options: GetOptions,
    ) -> Result<Vec<OrderView>, OrderLifecycleError> {
        self.query_orders(&warehouse_id, options.populate_warehouse, true).await
    }

    pub async fn next_order_number(&self, warehouse_id: WarehouseId) -> Result<u32, OrderLifecycleError> {
        self.sequencer.next(&warehouse_id).await
    }

    /// Non-deleted orders of the warehouse, newest first.
    async fn query_orders(
        &self,
        warehouse_id: &WarehouseId,
        populate_warehouse: bool,
        only_available_to_carrier: bool,
    ) -> Result<Vec<OrderView>, OrderLifecycleError> {
        let warehouse = self.warehouses.require_warehouse(warehouse_id.clone()).await?;

        let filter = if only_available_to_carrier {
            OrderFilter::available_to_carrier(warehouse_id.clone())
        } else {
            OrderFilter::for_warehouse(warehouse_id.clone())
        };
        let orders = self
            .orders
            .query_orders(filter.into_query().sort_by(newest_first))
            .await?;
        info!(%warehouse_id, count = orders.len(), "Orders by warehouse");

        let summary = populate_warehouse.then(|| warehouse.summary());
        Ok(orders
            .into_iter()
            .map(|order| OrderView {
                order,
                warehouse: summary.clone(),
            })
            .collect())
    }

    /// Takes every line out of available stock and books it as sold, line by line.
    async fn reserve_stock(&self, order: &Order, journal: &mut AdjustmentJournal) -> Result<(), OrderLifecycleError> {
        for line in &order.products {
            let product_id = line.product_id();
            self.inventory
                .decrease_available(&order.warehouse_id, product_id, line.count)
                .await?;
            journal.record(InventoryStep::DecreasedAvailable {
                product_id: product_id.clone(),
                count: line.count,
                pricing: line.restock_pricing(),
            });

            self.inventory
                .increase_sold_count(&order.warehouse_id, product_id, line.count)
                .await?;
            journal.record(InventoryStep::IncreasedSold {
                product_id: product_id.clone(),
                count: line.count,
            });
        }
        Ok(())
    }

    async fn restore_line(&self, warehouse_id: &WarehouseId, line: &OrderLineItem) -> Result<(), OrderLifecycleError> {
        self.inventory
            .add(warehouse_id, line.product_id(), line.count, line.restock_pricing())
            .await?;
        self.inventory
            .decrease_sold_count(warehouse_id, line.product_id(), line.count)
            .await?;
        Ok(())
    }

    /// Undoes the recorded inventory steps and cancels the orphaned order row.
    async fn compensate(&self, order: &Order, journal: AdjustmentJournal) {
        warn!(order_id = %order.id, steps = journal.steps().len(), "Compensating failed order creation");
        let failed = journal.roll_back(&self.inventory).await;
        if failed > 0 {
            error!(order_id = %order.id, failed, "Inventory rollback incomplete");
        }
        match self.orders.cancel_order(order.id.clone()).await {
            Ok(_) => info!(order_id = %order.id, "Orphaned order cancelled"),
            Err(e) => error!(order_id = %order.id, error = %e, "Failed to cancel orphaned order"),
        }
    }

    fn dispatch_new_order(&self, order: &Order, warehouse: &Warehouse) {
        let notification = NewOrderNotification::compose(order, warehouse, self.settings.operations_email.as_deref());
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let order_id = notification.order_id.clone();
            if let Err(e) = notifier.notify_new_order(notification).await {
                warn!(%order_id, error = %e, "New order notification failed");
            }
        });
    }
}

fn validate_lines(lines: &[OrderLineRequest]) -> Result<(), OrderLifecycleError> {
    if lines.is_empty() {
        return Err(OrderLifecycleError::InvalidRequest(
            "an order needs at least one product".to_string(),
        ));
    }
    if let Some(line) = lines.iter().find(|line| line.count == 0) {
        return Err(OrderLifecycleError::InvalidRequest(format!(
            "count of {} must be positive",
            line.product_id
        )));
    }
    Ok(())
}

/// Copies the current catalog entry of every requested product.
fn snapshot_lines(
    catalog: &WarehouseCatalog,
    lines: &[OrderLineRequest],
) -> Result<Vec<OrderLineItem>, OrderLifecycleError> {
    lines
        .iter()
        .map(|line| {
            catalog
                .entry(&line.product_id)
                .map(|entry| OrderLineItem::snapshot(entry, line.count))
                .ok_or_else(|| OrderLifecycleError::ProductNotInWarehouse {
                    warehouse_id: catalog.warehouse.id.clone(),
                    product_id: line.product_id.clone(),
                })
        })
        .collect()
}

/// Rejects requests the catalog cannot cover. The warehouse actor stays the
/// authority when creates race.
fn check_stock(catalog: &WarehouseCatalog, lines: &[OrderLineRequest]) -> Result<(), OrderLifecycleError> {
    let mut requested: HashMap<&ProductId, u32> = HashMap::new();
    for line in lines {
        let total = requested.entry(&line.product_id).or_default();
        *total = total.saturating_add(line.count);
    }

    for (product_id, requested) in requested {
        let available = catalog.entry(product_id).map_or(0, |entry| entry.listing.count);
        if requested > available {
            return Err(OrderLifecycleError::InsufficientStock {
                warehouse_id: catalog.warehouse.id.clone(),
                product_id: product_id.clone(),
                requested,
                available,
            });
        }
    }
    Ok(())
}
