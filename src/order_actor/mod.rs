//! Order store: order rows and their status transitions.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
