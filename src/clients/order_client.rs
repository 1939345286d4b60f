use tokio::sync::broadcast;
use tracing::{debug, instrument};

use crate::actor_framework::{ExistenceEvent, Query, ResourceClient};
use crate::domain::{CarrierId, CarrierStatus, Order, OrderCreate, OrderId, WarehouseStatus};
use crate::order_actor::{OrderAction, OrderActionResult, OrderError};

/// Client for interacting with the Order actor.
///
/// Besides the request/response methods it hands out subscriptions to the
/// process-wide stream of order existence events.
#[derive(Clone)]
pub struct OrderClient {
    inner: ResourceClient<Order>,
    existence: broadcast::Sender<ExistenceEvent<Order>>,
}

impl_client_methods!(OrderClient, Order, OrderId, OrderError, order);

impl OrderClient {
    pub fn new(inner: ResourceClient<Order>, existence: broadcast::Sender<ExistenceEvent<Order>>) -> Self {
        Self { inner, existence }
    }

    /// Subscribes to every order write made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ExistenceEvent<Order>> {
        self.existence.subscribe()
    }

    #[instrument(skip(self, order), fields(warehouse_id = %order.warehouse_id, order_number = order.order_number))]
    pub async fn create_order(&self, order: OrderCreate) -> Result<Order, OrderError> {
        debug!("Sending request");
        Ok(self.inner.create(order).await?)
    }

    #[instrument(skip(self, query))]
    pub async fn query_orders(&self, query: Query<Order>) -> Result<Vec<Order>, OrderError> {
        debug!(?query, "Sending request");
        Ok(self.inner.query(query).await?)
    }

    #[instrument(skip(self))]
    pub async fn update_delivery_notes(&self, id: OrderId, notes: Option<String>) -> Result<Order, OrderError> {
        debug!("Sending request");
        Ok(self.inner.update(id, notes).await?)
    }

    /// Cancels the order if it is not cancelled yet.
    ///
    /// Returns `None` when another caller cancelled it first.
    #[instrument(skip(self))]
    pub async fn cancel_order(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        match self.inner.perform_action(id, OrderAction::Cancel).await? {
            OrderActionResult::Cancelled(order) => Ok(Some(order)),
            OrderActionResult::AlreadyCancelled => Ok(None),
            other => Err(unexpected("cancel", other)),
        }
    }

    pub async fn confirm_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::Confirm).await
    }

    pub async fn advance_warehouse_status(&self, id: OrderId, status: WarehouseStatus) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::AdvanceWarehouseStatus(status)).await
    }

    pub async fn advance_carrier_status(&self, id: OrderId, status: CarrierStatus) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::AdvanceCarrierStatus(status)).await
    }

    pub async fn assign_carrier(&self, id: OrderId, carrier_id: CarrierId) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::AssignCarrier(carrier_id)).await
    }

    pub async fn mark_paid(&self, id: OrderId) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::MarkPaid).await
    }

    pub async fn soft_delete_order(&self, id: OrderId) -> Result<Order, OrderError> {
        self.transition(id, OrderAction::SoftDelete).await
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: OrderId, action: OrderAction) -> Result<Order, OrderError> {
        debug!("Sending request");
        let name = format!("{:?}", action);
        match self.inner.perform_action(id, action).await? {
            OrderActionResult::Updated(order) | OrderActionResult::Unchanged(order) => Ok(order),
            other => Err(unexpected(&name, other)),
        }
    }
}

fn unexpected(action: &str, result: OrderActionResult) -> OrderError {
    OrderError::UnexpectedResult {
        action: action.to_string(),
        result: format!("{:?}", result),
    }
}
