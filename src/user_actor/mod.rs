//! User store: the user directory consulted when an order names a customer.

pub mod entity;
pub mod error;

pub use error::*;
