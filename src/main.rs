use tracing::{error, info, Instrument};

use warehouse_orders::app_system::{setup_tracing, OrderSystem, SystemConfig};
use warehouse_orders::domain::{
    ForwardOrdersMethod, ProductCreate, UserCreate, WarehouseCreate, WarehouseProduct, WarehouseStatus,
};
use warehouse_orders::lifecycle::{
    GetOptions, OrderCreateInput, OrderLineRequest, PagingOptions, StatusBucket,
};

#[tokio::main]
async fn main() -> Result<(), String> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = SystemConfig::from_env();
    info!(?config, "Starting warehouse order system");
    let system = OrderSystem::new(config);

    let user_id = system
        .user_client
        .create_user(UserCreate::new("Alice", "alice@example.com"))
        .await
        .map_err(|e| e.to_string())?;
    let coffee = system
        .product_client
        .create_product(ProductCreate::new("Coffee", "Ground, 250g"))
        .await
        .map_err(|e| e.to_string())?;
    let croissant = system
        .product_client
        .create_product(ProductCreate::new("Croissant", "Butter"))
        .await
        .map_err(|e| e.to_string())?;

    let warehouse_id = system
        .warehouse_client
        .create_warehouse(
            WarehouseCreate::new("Main Street")
                .with_contact_email("orders@main-street.example")
                .forwarding_orders_by(ForwardOrdersMethod::Email)
                .with_product(WarehouseProduct::new(coffee.clone(), 10, 5.0).with_delivery_time(20, 40))
                .with_product(WarehouseProduct::new(croissant.clone(), 24, 1.5).with_initial_price(2.0)),
        )
        .await
        .map_err(|e| e.to_string())?;
    info!(%warehouse_id, "Warehouse stocked");

    let mut feed = system
        .orders
        .get(warehouse_id.clone(), GetOptions { populate_warehouse: true, ..Default::default() })
        .await
        .map_err(|e| e.to_string())?;
    let feed_task = tokio::spawn(
        async move {
            while let Some(listing) = feed.next().await {
                match listing {
                    Ok(orders) => info!(orders = orders.len(), "Live listing updated"),
                    Err(e) => error!(error = %e, "Live listing failed"),
                }
            }
        }
        .instrument(tracing::info_span!("live_feed")),
    );

    let span = tracing::info_span!("order_processing");
    let order = async {
        let input = OrderCreateInput::new(
            warehouse_id.clone(),
            vec![OrderLineRequest::new(coffee.clone(), 3), OrderLineRequest::new(croissant.clone(), 2)],
        )
        .for_user(user_id.clone())
        .with_delivery_notes("Ring twice");
        system.orders.create(input).await
    }
    .instrument(span)
    .await
    .map_err(|e| e.to_string())?;
    info!(order_id = %order.id, order_number = order.order_number, total = order.total_price(), "Order placed");

    system
        .order_client
        .confirm_order(order.id.clone())
        .await
        .map_err(|e| e.to_string())?;
    system
        .order_client
        .advance_warehouse_status(order.id.clone(), WarehouseStatus::WarehouseStartedProcessing)
        .await
        .map_err(|e| e.to_string())?;
    let pickable = system
        .orders
        .available_to_carrier(warehouse_id.clone(), GetOptions::default())
        .await
        .map_err(|e| e.to_string())?;
    info!(orders = pickable.len(), "Orders available to carriers");

    match system.orders.cancel(order.id.clone()).await {
        Ok(Some(cancelled)) => info!(order_id = %cancelled.id, "Order cancelled"),
        Ok(None) => info!("Order was already cancelled"),
        Err(e) => error!(error = %e, "Order cancellation failed"),
    }

    let cancelled = system
        .orders
        .list_for_warehouse(warehouse_id.clone(), PagingOptions::default(), StatusBucket::Cancelled)
        .await
        .map_err(|e| e.to_string())?;
    let next = system
        .orders
        .next_order_number(warehouse_id)
        .await
        .map_err(|e| e.to_string())?;
    info!(cancelled = cancelled.len(), next_order_number = next, "Lifecycle finished");

    // Stopping the feed releases its handles on the stores.
    feed_task.abort();
    let _ = feed_task.await;

    system.shutdown().await?;
    info!("Application completed successfully");
    Ok(())
}
