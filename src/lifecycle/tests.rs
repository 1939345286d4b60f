use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::app_system::{OrderSystem, SystemConfig};
use crate::domain::{
    CarrierStatus, Order, OrderId, OrderType, ProductCreate, ProductId, UserCreate, WarehouseCreate, WarehouseId,
    WarehouseProduct, WarehouseStatus, WarehouseUpdate,
};

use super::*;

struct Fixture {
    system: OrderSystem,
    warehouse_id: WarehouseId,
    product_id: ProductId,
}

impl Fixture {
    /// One warehouse selling one product: 10 available, none sold, price 5.
    async fn new(config: SystemConfig) -> Self {
        let system = OrderSystem::new(config);
        let product_id = system
            .product_client
            .create_product(ProductCreate::new("Coffee", "Ground, 250g"))
            .await
            .unwrap();
        let warehouse_id = system
            .warehouse_client
            .create_warehouse(WarehouseCreate::new("Main Street").with_product(WarehouseProduct::new(
                product_id.clone(),
                10,
                5.0,
            )))
            .await
            .unwrap();
        Self {
            system,
            warehouse_id,
            product_id,
        }
    }

    fn manager(&self) -> &OrderLifecycleManager {
        &self.system.orders
    }

    fn order_of(&self, count: u32) -> OrderCreateInput {
        OrderCreateInput::new(
            self.warehouse_id.clone(),
            vec![OrderLineRequest::new(self.product_id.clone(), count)],
        )
    }

    /// Available and sold counts of the fixture product.
    async fn levels(&self) -> (u32, u32) {
        let warehouse = self
            .system
            .warehouse_client
            .require_warehouse(self.warehouse_id.clone())
            .await
            .unwrap();
        let listing = warehouse.product(&self.product_id).unwrap();
        (listing.count, listing.sold_count)
    }
}

async fn bucket_ids(fixture: &Fixture, bucket: &str) -> HashSet<OrderId> {
    let bucket: StatusBucket = bucket.parse().unwrap();
    fixture
        .manager()
        .list_for_warehouse(fixture.warehouse_id.clone(), PagingOptions::default(), bucket)
        .await
        .unwrap()
        .into_iter()
        .map(|order| order.id)
        .collect()
}

async fn next_listing(feed: &mut LiveOrders) -> Vec<OrderView> {
    timeout(Duration::from_secs(2), feed.next())
        .await
        .expect("live feed emitted nothing")
        .expect("live feed closed")
        .unwrap()
}

#[tokio::test]
async fn test_create_then_cancel_restores_inventory() {
    let fixture = Fixture::new(SystemConfig::default()).await;

    let order = fixture.manager().create(fixture.order_of(3)).await.unwrap();
    assert_eq!(order.products.len(), 1);
    assert_eq!(order.products[0].count, 3);
    assert_eq!(order.products[0].price, 5.0);
    assert_eq!(order.products[0].product.title, "Coffee");
    assert!(!order.is_confirmed);
    assert_eq!(fixture.levels().await, (7, 3));

    let cancelled = fixture.manager().cancel(order.id.clone()).await.unwrap().unwrap();
    assert!(cancelled.is_cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(fixture.levels().await, (10, 0));

    fixture.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_line_items_keep_creation_price() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(2)).await.unwrap();

    fixture
        .system
        .warehouse_client
        .update_warehouse(
            fixture.warehouse_id.clone(),
            WarehouseUpdate {
                upsert_products: vec![WarehouseProduct::new(fixture.product_id.clone(), 0, 9.0)],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let stored = fixture.system.order_client.require_order(order.id.clone()).await.unwrap();
    assert_eq!(stored.products[0].price, 5.0);
    assert_eq!(stored.total_price(), 10.0);

    // Restocking keeps the catalog's current price.
    fixture.manager().cancel(order.id).await.unwrap();
    let warehouse = fixture
        .system
        .warehouse_client
        .require_warehouse(fixture.warehouse_id.clone())
        .await
        .unwrap();
    let listing = warehouse.product(&fixture.product_id).unwrap();
    assert_eq!(listing.price, 9.0);
    assert_eq!(listing.count, 10);
}

#[tokio::test]
async fn test_reprice_after_create_keeps_cancel_round_trip() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(3)).await.unwrap();
    assert_eq!(fixture.levels().await, (7, 3));

    fixture
        .system
        .warehouse_client
        .update_warehouse(
            fixture.warehouse_id.clone(),
            WarehouseUpdate {
                upsert_products: vec![WarehouseProduct::new(fixture.product_id.clone(), 7, 9.0)],
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(fixture.levels().await, (7, 3));

    let cancelled = fixture.manager().cancel(order.id).await.unwrap();
    assert!(cancelled.is_some());
    assert_eq!(fixture.levels().await, (10, 0));

    fixture.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_cancel_recreates_listing_removed_from_catalog() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(3)).await.unwrap();

    fixture
        .system
        .warehouse_client
        .update_warehouse(
            fixture.warehouse_id.clone(),
            WarehouseUpdate {
                remove_products: vec![fixture.product_id.clone()],
                ..Default::default()
            },
        )
        .await
        .unwrap();

    fixture.manager().cancel(order.id).await.unwrap().unwrap();

    let warehouse = fixture
        .system
        .warehouse_client
        .require_warehouse(fixture.warehouse_id.clone())
        .await
        .unwrap();
    let listing = warehouse.product(&fixture.product_id).unwrap();
    assert_eq!(listing.count, 3);
    assert_eq!(listing.price, 5.0);
}

#[tokio::test]
async fn test_second_cancel_has_no_effect() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(4)).await.unwrap();

    assert!(fixture.manager().cancel(order.id.clone()).await.unwrap().is_some());
    let after_first = fixture.system.order_client.require_order(order.id.clone()).await.unwrap();

    assert_eq!(fixture.manager().cancel(order.id.clone()).await.unwrap(), None);
    let after_second = fixture.system.order_client.require_order(order.id.clone()).await.unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(fixture.levels().await, (10, 0));
}

#[tokio::test]
async fn test_concurrent_cancels_transition_once() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(5)).await.unwrap();
    assert_eq!(fixture.levels().await, (5, 5));

    let first = fixture.manager().clone();
    let second = fixture.manager().clone();
    let (a, b) = tokio::join!(first.cancel(order.id.clone()), second.cancel(order.id.clone()));

    let transitions = [a.unwrap(), b.unwrap()].iter().filter(|outcome| outcome.is_some()).count();
    assert_eq!(transitions, 1);
    assert_eq!(fixture.levels().await, (10, 0));
}

#[tokio::test]
async fn test_order_numbers_count_up_per_warehouse() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    assert_eq!(fixture.manager().next_order_number(fixture.warehouse_id.clone()).await, Ok(1));

    let mut numbers = Vec::new();
    for _ in 0..3 {
        numbers.push(fixture.manager().create(fixture.order_of(1)).await.unwrap().order_number);
    }
    assert_eq!(numbers, vec![1, 2, 3]);
    assert_eq!(fixture.manager().next_order_number(fixture.warehouse_id.clone()).await, Ok(4));

    // Another warehouse starts over.
    let other = fixture
        .system
        .warehouse_client
        .create_warehouse(WarehouseCreate::new("Harbour"))
        .await
        .unwrap();
    assert_eq!(fixture.manager().next_order_number(other).await, Ok(1));

    let missing = fixture.manager().next_order_number("warehouse_404".into()).await;
    assert!(matches!(
        missing,
        Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::Warehouse, .. })
    ));
}

#[tokio::test]
async fn test_serialized_numbering_under_concurrency() {
    let fixture = Fixture::new(SystemConfig::default().with_numbering(NumberingStrategy::Serialized)).await;

    let creates = (0..4).map(|_| {
        let manager = fixture.manager().clone();
        let input = fixture.order_of(1);
        tokio::spawn(async move { manager.create(input).await })
    });
    let mut numbers = HashSet::new();
    for handle in creates.collect::<Vec<_>>() {
        numbers.insert(handle.await.unwrap().unwrap().order_number);
    }

    assert_eq!(numbers, HashSet::from([1, 2, 3, 4]));
    assert_eq!(fixture.manager().next_order_number(fixture.warehouse_id.clone()).await, Ok(5));
    assert_eq!(fixture.levels().await, (6, 4));
}

#[tokio::test]
async fn test_unstocked_product_changes_nothing() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let elsewhere = fixture
        .system
        .product_client
        .create_product(ProductCreate::new("Tea", "Loose leaf"))
        .await
        .unwrap();

    let input = OrderCreateInput::new(
        fixture.warehouse_id.clone(),
        vec![
            OrderLineRequest::new(fixture.product_id.clone(), 1),
            OrderLineRequest::new(elsewhere.clone(), 1),
        ],
    );
    let result = fixture.manager().create(input).await;

    assert_eq!(
        result,
        Err(OrderLifecycleError::ProductNotInWarehouse {
            warehouse_id: fixture.warehouse_id.clone(),
            product_id: elsewhere,
        })
    );
    assert_eq!(fixture.levels().await, (10, 0));
    let orders = fixture
        .manager()
        .list_for_warehouse(fixture.warehouse_id.clone(), PagingOptions::default(), StatusBucket::All)
        .await
        .unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_invalid_requests_are_rejected() {
    let fixture = Fixture::new(SystemConfig::default()).await;

    let empty = OrderCreateInput::new(fixture.warehouse_id.clone(), Vec::new());
    assert!(matches!(
        fixture.manager().create(empty).await,
        Err(OrderLifecycleError::InvalidRequest(_))
    ));
    assert!(matches!(
        fixture.manager().create(fixture.order_of(0)).await,
        Err(OrderLifecycleError::InvalidRequest(_))
    ));
    assert!(matches!(
        fixture.manager().create(fixture.order_of(11)).await,
        Err(OrderLifecycleError::InsufficientStock { requested: 11, available: 10, .. })
    ));
    assert!(matches!(
        fixture.manager().cancel("order_404".into()).await,
        Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::Order, .. })
    ));

    let unknown_warehouse = OrderCreateInput::new("warehouse_404", vec![OrderLineRequest::new("product_1", 1)]);
    assert!(matches!(
        fixture.manager().create(unknown_warehouse).await,
        Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::Warehouse, .. })
    ));
    assert_eq!(fixture.levels().await, (10, 0));
}

#[tokio::test]
async fn test_confirming_and_annotating_an_order() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(1)).await.unwrap();
    let orders = &fixture.system.order_client;

    let confirmed = orders.confirm_order(order.id.clone()).await.unwrap();
    assert!(confirmed.is_confirmed);
    // Confirming twice is a no-op, not an error.
    assert!(orders.confirm_order(order.id.clone()).await.unwrap().is_confirmed);

    let noted = orders
        .update_delivery_notes(order.id.clone(), Some("Leave at the back door".into()))
        .await
        .unwrap();
    assert_eq!(noted.delivery_notes.as_deref(), Some("Leave at the back door"));
    assert!(noted.is_confirmed);
}

#[tokio::test]
async fn test_manual_restock_through_inventory_coordinator() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(4)).await.unwrap();
    assert_eq!(fixture.levels().await, (6, 4));

    let levels = fixture
        .manager()
        .inventory()
        .add(&fixture.warehouse_id, &fixture.product_id, 5, order.products[0].restock_pricing())
        .await
        .unwrap();
    assert_eq!((levels.available, levels.sold), (11, 4));
    assert_eq!(fixture.levels().await, (11, 4));
}

#[tokio::test]
async fn test_status_buckets_list_matching_orders() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let manager = fixture.manager();
    let open = manager.create(fixture.order_of(1)).await.unwrap();
    let paid = manager.create(fixture.order_of(1)).await.unwrap();
    let cancelled = manager.create(fixture.order_of(1)).await.unwrap();

    fixture.system.order_client.mark_paid(paid.id.clone()).await.unwrap();
    fixture
        .system
        .order_client
        .advance_warehouse_status(paid.id.clone(), WarehouseStatus::ReadyForProcessing)
        .await
        .unwrap();
    manager.cancel(cancelled.id.clone()).await.unwrap();

    assert_eq!(bucket_ids(&fixture, "cancelled").await, HashSet::from([cancelled.id.clone()]));
    assert_eq!(
        bucket_ids(&fixture, "not_paid").await,
        HashSet::from([open.id.clone(), cancelled.id.clone()])
    );
    assert_eq!(bucket_ids(&fixture, "not_confirmed").await, HashSet::from([open.id.clone()]));
    assert_eq!(bucket_ids(&fixture, "confirmed").await, HashSet::from([paid.id.clone()]));
    assert_eq!(
        bucket_ids(&fixture, "relevant").await,
        HashSet::from([open.id.clone(), paid.id.clone()])
    );
    assert_eq!(bucket_ids(&fixture, "anything").await.len(), 3);

    // Soft-deleted orders disappear from every bucket.
    fixture.system.order_client.soft_delete_order(open.id.clone()).await.unwrap();
    assert_eq!(bucket_ids(&fixture, "anything").await.len(), 2);
}

#[tokio::test]
async fn test_list_pagination_and_sorting() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    for _ in 0..3 {
        fixture.manager().create(fixture.order_of(1)).await.unwrap();
    }

    let numbers = |orders: Vec<Order>| orders.into_iter().map(|order| order.order_number).collect::<Vec<_>>();

    let newest = fixture
        .manager()
        .list_for_warehouse(fixture.warehouse_id.clone(), PagingOptions::page(0, 2), StatusBucket::All)
        .await
        .unwrap();
    assert_eq!(numbers(newest), vec![3, 2]);

    let ascending = fixture
        .manager()
        .list_for_warehouse(
            fixture.warehouse_id.clone(),
            PagingOptions::page(1, 5).sorted_by(SortField::OrderNumber, SortDirection::Asc),
            StatusBucket::All,
        )
        .await
        .unwrap();
    assert_eq!(numbers(ascending), vec![2, 3]);
}

#[tokio::test]
async fn test_available_to_carrier() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let order = fixture.manager().create(fixture.order_of(1)).await.unwrap();
    let options = GetOptions { populate_warehouse: true, populate_carrier: true };

    let waiting = fixture
        .manager()
        .available_to_carrier(fixture.warehouse_id.clone(), options)
        .await
        .unwrap();
    assert!(waiting.is_empty());

    fixture
        .system
        .order_client
        .advance_warehouse_status(order.id.clone(), WarehouseStatus::PackagingFinished)
        .await
        .unwrap();
    let ready = fixture
        .manager()
        .available_to_carrier(fixture.warehouse_id.clone(), options)
        .await
        .unwrap();
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].warehouse.as_ref().map(|w| w.name.as_str()), Some("Main Street"));
    let without_carrier = GetOptions { populate_carrier: false, ..options };
    assert_eq!(
        fixture
            .manager()
            .available_to_carrier(fixture.warehouse_id.clone(), without_carrier)
            .await
            .unwrap(),
        ready
    );

    fixture
        .system
        .order_client
        .assign_carrier(order.id.clone(), "carrier_1".into())
        .await
        .unwrap();
    fixture
        .system
        .order_client
        .advance_carrier_status(order.id.clone(), CarrierStatus::CarrierSelectedOrder)
        .await
        .unwrap();
    let taken = fixture
        .manager()
        .available_to_carrier(fixture.warehouse_id.clone(), options)
        .await
        .unwrap();
    assert!(taken.is_empty());
}

#[tokio::test]
async fn test_live_feed_follows_order_writes() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let other = fixture
        .system
        .warehouse_client
        .create_warehouse(WarehouseCreate::new("Harbour"))
        .await
        .unwrap();

    let mut feed = fixture
        .manager()
        .get(fixture.warehouse_id.clone(), GetOptions::default())
        .await
        .unwrap();
    assert!(next_listing(&mut feed).await.is_empty());

    let order = fixture.manager().create(fixture.order_of(2)).await.unwrap();
    let listing = next_listing(&mut feed).await;
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].order.id, order.id);
    assert!(listing[0].warehouse.is_none());

    // Orders of other warehouses do not wake the feed.
    let mut other_feed = fixture.manager().get(other.clone(), GetOptions::default()).await.unwrap();
    assert!(next_listing(&mut other_feed).await.is_empty());

    fixture.manager().cancel(order.id.clone()).await.unwrap();
    let listing = next_listing(&mut feed).await;
    assert!(listing[0].order.is_cancelled);
    assert!(timeout(Duration::from_millis(50), other_feed.next()).await.is_err());

    drop(feed);
    drop(other_feed);
    fixture.system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_live_feed_requires_existing_warehouse() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let result = fixture.manager().get("warehouse_404".into(), GetOptions::default()).await;
    assert!(matches!(
        result,
        Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::Warehouse, .. })
    ));
}

#[tokio::test]
async fn test_create_single_product() {
    let fixture = Fixture::new(SystemConfig::default()).await;
    let user_id = fixture
        .system
        .user_client
        .create_user(UserCreate::new("Ada", "ada@example.com"))
        .await
        .unwrap();

    let order = fixture
        .manager()
        .create_single_product(
            user_id.clone(),
            fixture.warehouse_id.clone(),
            fixture.product_id.clone(),
            OrderType::Takeaway,
        )
        .await
        .unwrap();
    assert_eq!(order.user_id, Some(user_id));
    assert_eq!(order.order_type, OrderType::Takeaway);
    assert_eq!(order.products[0].count, 1);
    assert_eq!(fixture.levels().await, (9, 1));

    let unknown_user = fixture
        .manager()
        .create_single_product(
            "user_404".into(),
            fixture.warehouse_id.clone(),
            fixture.product_id.clone(),
            OrderType::Delivery,
        )
        .await;
    assert!(matches!(
        unknown_user,
        Err(OrderLifecycleError::ReferenceNotFound { kind: ReferenceKind::User, .. })
    ));
}

struct FailingNotifier {
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn notify_new_order(&self, _notification: NewOrderNotification) -> Result<(), NotificationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(NotificationError("mailbox full".to_string()))
    }
}

struct CountingHook {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl CancellationHook for CountingHook {
    async fn on_confirmed_order_cancelled(&self, _order: &Order) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_collaborator_failures_and_hooks() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let calls = Arc::new(AtomicUsize::new(0));
    let system = OrderSystem::with_collaborators(
        SystemConfig::default(),
        Arc::new(FailingNotifier { attempts: attempts.clone() }),
        Arc::new(CountingHook { calls: calls.clone() }),
    );
    let product_id = system
        .product_client
        .create_product(ProductCreate::new("Coffee", "Ground, 250g"))
        .await
        .unwrap();
    let warehouse_id = system
        .warehouse_client
        .create_warehouse(WarehouseCreate::new("Main Street").with_product(WarehouseProduct::new(
            product_id.clone(),
            10,
            5.0,
        )))
        .await
        .unwrap();
    let input = || OrderCreateInput::new(warehouse_id.clone(), vec![OrderLineRequest::new(product_id.clone(), 1)]);

    let confirmed = system.orders.create(input().auto_confirmed()).await.unwrap();
    let unconfirmed = system.orders.create(input()).await.unwrap();
    assert!(confirmed.is_confirmed);

    system.orders.cancel(unconfirmed.id).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    system.orders.cancel(confirmed.id).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    timeout(Duration::from_secs(1), async {
        while attempts.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("notifications were not dispatched");

    system.shutdown().await.unwrap();
}
