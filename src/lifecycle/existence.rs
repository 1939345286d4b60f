//! Per-warehouse view of the order existence stream.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::actor_framework::ExistenceEvent;
use crate::clients::OrderClient;
use crate::domain::{Order, WarehouseId};

/// Whether an order write concerns the warehouse.
///
/// Created matches on the new value, Removed on the prior one, Updated on either,
/// so an order moved away from a warehouse still refreshes its listing.
pub fn is_relevant(event: &ExistenceEvent<Order>, warehouse_id: &WarehouseId) -> bool {
    match event {
        ExistenceEvent::Created { value } => value.warehouse_id == *warehouse_id,
        ExistenceEvent::Updated { value, last_value } => {
            value.warehouse_id == *warehouse_id || last_value.warehouse_id == *warehouse_id
        }
        ExistenceEvent::Removed { last_value } => last_value.warehouse_id == *warehouse_id,
    }
}

#[derive(Debug, Clone)]
pub enum WarehouseOrderEvent {
    Existence(ExistenceEvent<Order>),
    /// The upstream subscription fell behind; this many events were lost unseen.
    Lagged(u64),
}

/// Filters the global order stream down to one warehouse.
///
/// Holds a single upstream subscription and re-broadcasts relevant events to
/// every subscriber. The forwarding task stops when the filter is dropped.
/// The task owns the only downstream sender, so subscribers observe `Closed`
/// once the upstream stream closes.
pub struct ExistenceEventFilter {
    warehouse_id: WarehouseId,
    sender: Weak<broadcast::Sender<WarehouseOrderEvent>>,
    forwarder: JoinHandle<()>,
}

impl ExistenceEventFilter {
    pub fn spawn(
        warehouse_id: WarehouseId,
        mut upstream: broadcast::Receiver<ExistenceEvent<Order>>,
        capacity: usize,
    ) -> Self {
        let (downstream, _) = broadcast::channel(capacity);
        let downstream = Arc::new(downstream);
        let sender = Arc::downgrade(&downstream);
        let scope = warehouse_id.clone();

        let forwarder = tokio::spawn(async move {
            loop {
                let event = match upstream.recv().await {
                    Ok(event) if is_relevant(&event, &scope) => WarehouseOrderEvent::Existence(event),
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(warehouse_id = %scope, skipped, "Order existence stream lagged");
                        WarehouseOrderEvent::Lagged(skipped)
                    }
                    Err(RecvError::Closed) => break,
                };
                // No subscribers right now is fine.
                let _ = downstream.send(event);
            }
            debug!(warehouse_id = %scope, "Order existence stream closed");
        });

        Self {
            warehouse_id,
            sender,
            forwarder,
        }
    }

    pub fn warehouse_id(&self) -> &WarehouseId {
        &self.warehouse_id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WarehouseOrderEvent> {
        match self.sender.upgrade() {
            Some(sender) => sender.subscribe(),
            None => {
                // Forwarder already finished: hand out a receiver that is closed.
                let (_, receiver) = broadcast::channel(1);
                receiver
            }
        }
    }
}

impl Drop for ExistenceEventFilter {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Shares one [`ExistenceEventFilter`] per warehouse between all live feeds.
#[derive(Clone)]
pub struct ExistenceFilters {
    orders: OrderClient,
    capacity: usize,
    filters: Arc<Mutex<HashMap<WarehouseId, Weak<ExistenceEventFilter>>>>,
}

impl ExistenceFilters {
    pub fn new(orders: OrderClient, capacity: usize) -> Self {
        Self {
            orders,
            capacity,
            filters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn for_warehouse(&self, warehouse_id: &WarehouseId) -> Arc<ExistenceEventFilter> {
        let mut filters = self.filters.lock().await;
        if let Some(filter) = filters.get(warehouse_id).and_then(Weak::upgrade) {
            return filter;
        }

        filters.retain(|_, filter| filter.strong_count() > 0);
        let filter = Arc::new(ExistenceEventFilter::spawn(
            warehouse_id.clone(),
            self.orders.subscribe(),
            self.capacity,
        ));
        filters.insert(warehouse_id.clone(), Arc::downgrade(&filter));
        debug!(%warehouse_id, active = filters.len(), "Existence filter started");
        filter
    }
}
