//! Warehouse order lifecycle on top of a small actor framework.
//!
//! Every store (users, products, warehouses, orders) is a [`ResourceActor`]
//! reached through a typed client. [`OrderLifecycleManager`] orchestrates
//! order creation and cancellation across them while keeping inventory
//! counters coherent, and serves live per-warehouse order listings.
//!
//! [`ResourceActor`]: actor_framework::ResourceActor
//! [`OrderLifecycleManager`]: lifecycle::OrderLifecycleManager

pub mod actor_framework;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod lifecycle;
pub mod order_actor;
pub mod product_actor;
pub mod user_actor;
pub mod warehouse_actor;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
