//! Order lifecycle over the warehouse, product, user and order stores.
//!
//! [`OrderLifecycleManager`] is the entry point. The remaining types are the
//! pieces it is built from and can be used on their own.

pub mod compensation;
pub mod error;
pub mod existence;
pub mod inventory;
pub mod live;
pub mod manager;
pub mod notifications;
pub mod paging;
pub mod sequencer;
pub mod status_query;

#[cfg(test)]
mod tests;

pub use compensation::{AdjustmentJournal, InventoryStep};
pub use error::{OrderLifecycleError, ReferenceKind};
pub use existence::{is_relevant, ExistenceEventFilter, ExistenceFilters, WarehouseOrderEvent};
pub use inventory::InventoryAdjustmentCoordinator;
pub use live::{LiveOrders, OrderListing};
pub use manager::*;
pub use notifications::*;
pub use paging::{PagingOptions, SortDirection, SortField, SortOrder};
pub use sequencer::{NumberingStrategy, OrderNumberSequencer};
pub use status_query::{is_completed, OrderFilter, StatusBucket};
