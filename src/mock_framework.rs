//! # Mock Framework
//!
//! Utilities for testing clients and orchestration in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_action`] to assert the
//! requests and script the replies.

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};

use crate::actor_framework::{Entity, FrameworkError, Query, ResourceClient, ResourceRequest};
use crate::domain::{
    CarrierStatus, Order, OrderLineItem, OrderType, Product, Warehouse, WarehouseProduct, WarehouseStatus,
};

type Responder<R> = oneshot::Sender<Result<R, FrameworkError>>;

/// Creates a mock client and a receiver for asserting requests.
///
/// The client sends to a channel the test controls, so replies (success,
/// failure, delays) are scripted deterministically without a running actor.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Responder<T>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Responder<Option<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Responder<T::ActionResult>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Query request
pub async fn expect_query<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Query<T>, Responder<Vec<T>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Query { query, respond_to }) => Some((query, respond_to)),
        _ => None,
    }
}

pub fn sample_product(id: &str, title: &str) -> Product {
    Product {
        id: id.into(),
        title: title.to_string(),
        description: String::new(),
    }
}

pub fn sample_warehouse(id: &str, listings: Vec<WarehouseProduct>) -> Warehouse {
    Warehouse {
        id: id.into(),
        name: "Corner Shop".to_string(),
        contact_email: None,
        forward_orders_using: Vec::new(),
        products: listings
            .into_iter()
            .map(|listing| (listing.product_id.clone(), listing))
            .collect(),
    }
}

/// An open order of two coffees, number 1.
pub fn sample_order(id: &str, warehouse_id: &str) -> Order {
    Order {
        id: id.into(),
        warehouse_id: warehouse_id.into(),
        user_id: None,
        carrier_id: None,
        order_number: 1,
        products: vec![OrderLineItem {
            product: sample_product("product_1", "Coffee"),
            count: 2,
            price: 2.5,
            initial_price: 2.5,
            delivery_time_min: None,
            delivery_time_max: None,
            is_manufacturing: false,
            is_carrier_required: true,
            is_delivery_required: true,
            is_takeaway: false,
        }],
        warehouse_status: WarehouseStatus::NoStatus,
        carrier_status: CarrierStatus::NoCarrier,
        is_confirmed: false,
        is_cancelled: false,
        is_paid: false,
        is_deleted: false,
        delivery_notes: None,
        order_type: OrderType::Delivery,
        created_at: Utc::now(),
        cancelled_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{User, UserCreate};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<User>(10);

        let create_task = tokio::spawn(async move {
            let user = UserCreate::new("Test", "test@example.com");
            client.create(user).await
        });

        let (payload, responder) = expect_create(&mut receiver).await.expect("Expected Create request");
        assert_eq!(payload.name, "Test");
        let user = User::from_create_params("user_1".into(), payload).unwrap();
        responder.send(Ok(user.clone())).unwrap();

        let result = create_task.await.unwrap();
        assert_eq!(result, Ok(user));
    }

    #[tokio::test]
    async fn test_mock_query_runs_against_scripted_items() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        let query_task = tokio::spawn(async move {
            client
                .query(Query::all().filter(|order: &Order| order.warehouse_id.as_str() == "warehouse_2"))
                .await
        });

        let (query, responder) = expect_query(&mut receiver).await.expect("Expected Query request");
        let candidates = [sample_order("order_1", "warehouse_1"), sample_order("order_2", "warehouse_2")];
        let matching: Vec<Order> = candidates.into_iter().filter(|order| query.matches(order)).collect();
        responder.send(Ok(matching)).unwrap();

        let orders = query_task.await.unwrap().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id.as_str(), "order_2");
    }
}
