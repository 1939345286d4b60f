use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{ForwardOrdersMethod, Order, OrderId, Warehouse, WarehouseId};

#[derive(Debug, Clone, Error, PartialEq)]
#[error("Notification delivery failed: {0}")]
pub struct NotificationError(pub String);

/// Summary of a freshly placed order for the people who have to fulfil it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrderNotification {
    pub order_id: OrderId,
    pub order_number: u32,
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub recipients: Vec<String>,
    /// One `count x title` entry per line item.
    pub lines: Vec<String>,
    pub total_price: f64,
}

impl NewOrderNotification {
    /// Addresses the operations mailbox and, when the warehouse forwards orders
    /// by e-mail, its contact address.
    pub fn compose(order: &Order, warehouse: &Warehouse, operations_email: Option<&str>) -> Self {
        let mut recipients: Vec<String> = operations_email.map(str::to_string).into_iter().collect();
        if warehouse.forwards_orders_by(ForwardOrdersMethod::Email) {
            match &warehouse.contact_email {
                Some(email) if !recipients.contains(email) => recipients.push(email.clone()),
                Some(_) => {}
                None => warn!(warehouse_id = %warehouse.id, "Warehouse forwards orders by e-mail but has no contact address"),
            }
        }
        if warehouse.forwards_orders_by(ForwardOrdersMethod::Phone) {
            warn!(warehouse_id = %warehouse.id, "Forwarding orders by phone is not supported");
        }

        Self {
            order_id: order.id.clone(),
            order_number: order.order_number,
            warehouse_id: warehouse.id.clone(),
            warehouse_name: warehouse.name.clone(),
            recipients,
            lines: order
                .products
                .iter()
                .map(|line| format!("{} x {}", line.count, line.product.title))
                .collect(),
            total_price: order.total_price(),
        }
    }

    pub fn subject(&self) -> String {
        format!("New order #{} at {}", self.order_number, self.warehouse_name)
    }
}

/// Delivers new-order notifications. Called fire-and-forget.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_new_order(&self, notification: NewOrderNotification) -> Result<(), NotificationError>;
}

/// Writes notifications to the log instead of sending them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationDispatcher for LogNotifier {
    async fn notify_new_order(&self, notification: NewOrderNotification) -> Result<(), NotificationError> {
        if notification.recipients.is_empty() {
            debug!(order_id = %notification.order_id, "New order has no notification recipients");
            return Ok(());
        }
        info!(
            order_id = %notification.order_id,
            recipients = ?notification.recipients,
            lines = ?notification.lines,
            subject = %notification.subject(),
            "New order notification"
        );
        Ok(())
    }
}

/// Called after a confirmed order was cancelled, before stock is restored.
#[async_trait]
pub trait CancellationHook: Send + Sync {
    async fn on_confirmed_order_cancelled(&self, order: &Order);
}

#[derive(Debug, Clone, Default)]
pub struct NoopCancellationHook;

#[async_trait]
impl CancellationHook for NoopCancellationHook {
    async fn on_confirmed_order_cancelled(&self, order: &Order) {
        debug!(order_id = %order.id, "No follow-up for cancelled confirmed order");
    }
}
