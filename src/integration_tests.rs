#[cfg(test)]
mod tests {
    use tokio::sync::{broadcast, mpsc};

    use crate::actor_framework::{Entity, ResourceRequest};
    use crate::app_system::SystemConfig;
    use crate::clients::{OrderClient, ProductClient, UserClient, WarehouseClient};
    use crate::domain::{Order, Product, User, UserCreate, Warehouse, WarehouseProduct};
    use crate::lifecycle::{
        OrderCreateInput, OrderLifecycleError, OrderLifecycleManager, OrderLineRequest, ReferenceKind,
    };
    use crate::mock_framework::{
        create_mock_client, expect_action, expect_create, expect_get, expect_query, sample_product, sample_warehouse,
    };
    use crate::order_actor::{OrderAction, OrderActionResult};
    use crate::warehouse_actor::{InventoryLevels, ViolationReason, WarehouseAction, WarehouseActionResult};

    struct Mocks {
        users: mpsc::Receiver<ResourceRequest<User>>,
        products: mpsc::Receiver<ResourceRequest<Product>>,
        warehouses: mpsc::Receiver<ResourceRequest<Warehouse>>,
        orders: mpsc::Receiver<ResourceRequest<Order>>,
    }

    fn mocked_manager(config: SystemConfig) -> (OrderLifecycleManager, Mocks) {
        let (user_inner, users) = create_mock_client::<User>(10);
        let (product_inner, products) = create_mock_client::<Product>(10);
        let (warehouse_inner, warehouses) = create_mock_client::<Warehouse>(10);
        let (order_inner, orders) = create_mock_client::<Order>(10);
        let (existence, _) = broadcast::channel(16);

        let product_client = ProductClient::new(product_inner);
        let manager = OrderLifecycleManager::new(
            UserClient::new(user_inner),
            product_client.clone(),
            WarehouseClient::new(warehouse_inner, product_client),
            OrderClient::new(order_inner, existence),
            &config,
        );
        (manager, Mocks { users, products, warehouses, orders })
    }

    fn stocked_warehouse() -> Warehouse {
        sample_warehouse(
            "warehouse_1",
            vec![
                WarehouseProduct::new("product_1", 10, 5.0),
                WarehouseProduct::new("product_2", 1, 3.0),
            ],
        )
    }

    /// Answers the catalog load: the warehouse itself, then one product lookup per listing.
    async fn serve_catalog(mocks: &mut Mocks, warehouse: Warehouse) {
        let listings = warehouse.products.len();
        let (id, responder) = expect_get(&mut mocks.warehouses).await.expect("Expected Warehouse Get");
        assert_eq!(id.as_str(), "warehouse_1");
        responder.send(Ok(Some(warehouse))).unwrap();

        for _ in 0..listings {
            let (id, responder) = expect_get(&mut mocks.products).await.expect("Expected Product Get");
            let title = format!("Title of {}", id);
            responder.send(Ok(Some(sample_product(id.as_str(), &title)))).unwrap();
        }
    }

    /// Answers the order number scan with no orders today.
    async fn serve_empty_numbering(mocks: &mut Mocks, warehouse: Warehouse) {
        let (_, responder) = expect_get(&mut mocks.warehouses).await.expect("Expected Warehouse Get");
        responder.send(Ok(Some(warehouse))).unwrap();
        let (_, responder) = expect_query(&mut mocks.orders).await.expect("Expected Order Query");
        responder.send(Ok(Vec::new())).unwrap();
    }

    async fn serve_order_create(mocks: &mut Mocks) -> Order {
        let (payload, responder) = expect_create(&mut mocks.orders).await.expect("Expected Order Create");
        assert_eq!(payload.order_number, 1);
        let order = Order::from_create_params("order_1".into(), payload).unwrap();
        responder.send(Ok(order.clone())).unwrap();
        order
    }

    async fn expect_adjustment(mocks: &mut Mocks, expected: WarehouseAction, reply: WarehouseActionResult) {
        let (id, action, responder) = expect_action(&mut mocks.warehouses)
            .await
            .expect("Expected Warehouse Action");
        assert_eq!(id.as_str(), "warehouse_1");
        assert_eq!(action, expected);
        responder.send(Ok(reply)).unwrap();
    }

    fn adjusted(available: u32, sold: u32) -> WarehouseActionResult {
        WarehouseActionResult::Adjusted(InventoryLevels { available, sold })
    }

    fn two_line_input() -> OrderCreateInput {
        OrderCreateInput::new(
            "warehouse_1",
            vec![OrderLineRequest::new("product_1", 2), OrderLineRequest::new("product_2", 1)],
        )
    }

    #[tokio::test]
    async fn test_unstocked_product_never_reaches_the_order_store() {
        let (manager, mut mocks) = mocked_manager(SystemConfig::default());

        let create_task = tokio::spawn(async move {
            let input = OrderCreateInput::new("warehouse_1", vec![OrderLineRequest::new("product_9", 1)])
                .for_user("user_1");
            manager.create(input).await
        });

        let (user_id, responder) = expect_get(&mut mocks.users).await.expect("Expected User Get");
        assert_eq!(user_id.as_str(), "user_1");
        let user = User::from_create_params(user_id, UserCreate::new("Ada", "ada@example.com")).unwrap();
        responder.send(Ok(Some(user))).unwrap();

        serve_catalog(&mut mocks, stocked_warehouse()).await;

        let result = create_task.await.unwrap();
        assert_eq!(
            result,
            Err(OrderLifecycleError::ProductNotInWarehouse {
                warehouse_id: "warehouse_1".into(),
                product_id: "product_9".into(),
            })
        );
        assert!(mocks.orders.try_recv().is_err());
        assert!(mocks.warehouses.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_user_is_reported() {
        let (manager, mut mocks) = mocked_manager(SystemConfig::default());

        let create_task = tokio::spawn(async move { manager.create(two_line_input().for_user("user_9")).await });

        let (_, responder) = expect_get(&mut mocks.users).await.expect("Expected User Get");
        responder.send(Ok(None)).unwrap();

        let result = create_task.await.unwrap();
        assert!(matches!(
            result,
            Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::User, .. })
        ));
        assert!(mocks.warehouses.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_partial_failure_is_compensated() {
        let (manager, mut mocks) = mocked_manager(SystemConfig::default().with_compensation());
        let create_task = tokio::spawn(async move { manager.create(two_line_input()).await });

        serve_catalog(&mut mocks, stocked_warehouse()).await;
        serve_empty_numbering(&mut mocks, stocked_warehouse()).await;
        let order = serve_order_create(&mut mocks).await;
        let pricing = order.products[0].restock_pricing();

        expect_adjustment(
            &mut mocks,
            WarehouseAction::DecreaseAvailable { product_id: "product_1".into(), count: 2 },
            adjusted(8, 0),
        )
        .await;
        expect_adjustment(
            &mut mocks,
            WarehouseAction::IncreaseSold { product_id: "product_1".into(), count: 2 },
            adjusted(8, 2),
        )
        .await;
        // Someone else bought the last unit in the meantime.
        expect_adjustment(
            &mut mocks,
            WarehouseAction::DecreaseAvailable { product_id: "product_2".into(), count: 1 },
            WarehouseActionResult::Violation(ViolationReason::AvailableBelowZero { available: 0 }),
        )
        .await;

        // Inverses run newest first.
        expect_adjustment(
            &mut mocks,
            WarehouseAction::DecreaseSold { product_id: "product_1".into(), count: 2 },
            adjusted(8, 0),
        )
        .await;
        expect_adjustment(
            &mut mocks,
            WarehouseAction::Restock { product_id: "product_1".into(), count: 2, pricing },
            adjusted(10, 0),
        )
        .await;

        let (order_id, action, responder) = expect_action(&mut mocks.orders).await.expect("Expected Order Cancel");
        assert_eq!(order_id, order.id);
        assert_eq!(action, OrderAction::Cancel);
        let mut cancelled = order.clone();
        cancelled.is_cancelled = true;
        responder.send(Ok(OrderActionResult::Cancelled(cancelled))).unwrap();

        let result = create_task.await.unwrap();
        assert!(matches!(
            result,
            Err(OrderLifecycleError::InventoryViolation { action: "decrease_available", count: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_partial_failure_without_compensation_keeps_applied_steps() {
        let (manager, mut mocks) = mocked_manager(SystemConfig::default());
        let create_task = tokio::spawn(async move { manager.create(two_line_input()).await });

        serve_catalog(&mut mocks, stocked_warehouse()).await;
        serve_empty_numbering(&mut mocks, stocked_warehouse()).await;
        serve_order_create(&mut mocks).await;

        expect_adjustment(
            &mut mocks,
            WarehouseAction::DecreaseAvailable { product_id: "product_1".into(), count: 2 },
            adjusted(8, 0),
        )
        .await;
        expect_adjustment(
            &mut mocks,
            WarehouseAction::IncreaseSold { product_id: "product_1".into(), count: 2 },
            WarehouseActionResult::Violation(ViolationReason::NotStocked),
        )
        .await;

        let result = create_task.await.unwrap();
        assert!(matches!(result, Err(OrderLifecycleError::InventoryViolation { .. })));
        assert!(mocks.warehouses.try_recv().is_err());
        assert!(mocks.orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stock_precheck_aggregates_lines() {
        let (manager, mut mocks) = mocked_manager(SystemConfig::default());
        let create_task = tokio::spawn(async move {
            let input = OrderCreateInput::new(
                "warehouse_1",
                vec![OrderLineRequest::new("product_2", 1), OrderLineRequest::new("product_2", 1)],
            );
            manager.create(input).await
        });

        serve_catalog(&mut mocks, stocked_warehouse()).await;

        let result = create_task.await.unwrap();
        assert_eq!(
            result,
            Err(OrderLifecycleError::InsufficientStock {
                warehouse_id: "warehouse_1".into(),
                product_id: "product_2".into(),
                requested: 2,
                available: 1,
            })
        );
        assert!(mocks.orders.try_recv().is_err());
    }
}
