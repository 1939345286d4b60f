//! Warehouse store: catalogs and their inventory counters.
//!
//! Counters only move through [`WarehouseAction`]s, which the actor applies one
//! at a time, so concurrent adjustments of the same warehouse never interleave.

pub mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
