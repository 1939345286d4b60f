use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::actor_framework::{Entity, ResourceActor};
use crate::clients::{OrderClient, ProductClient, UserClient, WarehouseClient};
use crate::domain::{Order, Product, User, Warehouse};
use crate::lifecycle::{CancellationHook, NotificationDispatcher, OrderLifecycleManager};

use super::config::SystemConfig;

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct OrderSystem {
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub warehouse_client: WarehouseClient,
    pub order_client: OrderClient,
    pub orders: OrderLifecycleManager,
    config: SystemConfig,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl OrderSystem {
    pub fn new(config: SystemConfig) -> Self {
        let mut handles = Vec::new();

        let (user_actor, user_resource_client) =
            ResourceActor::<User>::new(config.actor_buffer_size, sequential_ids::<User>("user"));
        let user_client = UserClient::new(user_resource_client);
        handles.push(tokio::spawn(user_actor.run()));

        let (product_actor, product_resource_client) =
            ResourceActor::<Product>::new(config.actor_buffer_size, sequential_ids::<Product>("product"));
        let product_client = ProductClient::new(product_resource_client);
        handles.push(tokio::spawn(product_actor.run()));

        let (warehouse_actor, warehouse_resource_client) =
            ResourceActor::<Warehouse>::new(config.actor_buffer_size, sequential_ids::<Warehouse>("warehouse"));
        let warehouse_client = WarehouseClient::new(warehouse_resource_client, product_client.clone());
        handles.push(tokio::spawn(warehouse_actor.run()));

        // Orders publish every write for the live feeds.
        let (existence, _) = broadcast::channel(config.existence_capacity);
        let (order_actor, order_resource_client) =
            ResourceActor::<Order>::new(config.actor_buffer_size, sequential_ids::<Order>("order"));
        let order_client = OrderClient::new(order_resource_client, existence.clone());
        handles.push(tokio::spawn(order_actor.publish_existence(existence).run()));

        let orders = OrderLifecycleManager::new(
            user_client.clone(),
            product_client.clone(),
            warehouse_client.clone(),
            order_client.clone(),
            &config,
        );
        info!(numbering = ?config.numbering, compensate = config.compensate_partial_failures, "Order system started");

        Self {
            user_client,
            product_client,
            warehouse_client,
            order_client,
            orders,
            config,
            handles,
        }
    }

    /// Starts the system with custom notification and cancellation collaborators.
    pub fn with_collaborators(
        config: SystemConfig,
        notifier: Arc<dyn NotificationDispatcher>,
        cancellation_hook: Arc<dyn CancellationHook>,
    ) -> Self {
        let mut system = Self::new(config);
        system.orders = system
            .orders
            .with_notifier(notifier)
            .with_cancellation_hook(cancellation_hook);
        system
    }

    /// Drops every client and waits for the actors to drain their mailboxes.
    ///
    /// Live feeds still open keep their stores alive; the wait is bounded by
    /// the configured shutdown timeout.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");
        let timeout = self.config.shutdown_timeout();

        drop(self.orders);
        drop(self.order_client);
        drop(self.warehouse_client);
        drop(self.product_client);
        drop(self.user_client);

        let drained = tokio::time::timeout(timeout, async {
            for handle in self.handles {
                if let Err(e) = handle.await {
                    error!("Actor task failed: {:?}", e);
                    return Err(format!("Actor task failed: {:?}", e));
                }
            }
            Ok(())
        })
        .await;

        match drained {
            Ok(result) => {
                result?;
                info!("System shutdown complete.");
                Ok(())
            }
            Err(_) => {
                error!(timeout_ms = self.config.shutdown_timeout_ms, "Actors did not stop in time");
                Err(format!("Shutdown timed out after {:?}", timeout))
            }
        }
    }
}

fn sequential_ids<T: Entity>(prefix: &'static str) -> impl Fn() -> T::Id + Send + Sync + 'static
where
    T::Id: From<String>,
{
    let counter = Arc::new(AtomicU64::new(1));
    move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        T::Id::from(format!("{}_{}", prefix, id))
    }
}
