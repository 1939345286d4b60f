//! Typed handles over the store actors.

#[macro_use]
mod macros;

pub mod order_client;
pub mod product_client;
pub mod user_client;
pub mod warehouse_client;

pub use order_client::*;
pub use product_client::*;
pub use user_client::*;
pub use warehouse_client::*;
