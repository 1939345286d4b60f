use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::actor_framework::Query;
use crate::domain::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    CreatedAt,
    OrderNumber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Window over an order listing. Without an explicit sort the newest orders come first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingOptions {
    #[serde(default)]
    pub skip: usize,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

impl PagingOptions {
    pub fn page(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: Some(limit),
            sort: None,
        }
    }

    pub fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort = Some(SortOrder { field, direction });
        self
    }

    pub fn apply(&self, query: Query<Order>) -> Query<Order> {
        let query = match self.sort {
            Some(SortOrder { field, direction }) => query.sort_by(move |a: &Order, b: &Order| {
                let ordering = match field {
                    SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortField::OrderNumber => a.order_number.cmp(&b.order_number),
                };
                match direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }),
            None => query.sort_by(newest_first),
        };
        let query = query.skip(self.skip);
        match self.limit {
            Some(limit) => query.limit(limit),
            None => query,
        }
    }
}

/// Creation time descending; order number breaks ties within the same instant.
pub fn newest_first(a: &Order, b: &Order) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.order_number.cmp(&a.order_number))
}
