//! Product store: product definitions shared by every warehouse catalog.

pub mod entity;
pub mod error;

pub use error::*;
