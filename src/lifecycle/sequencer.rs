use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::actor_framework::Query;
use crate::clients::{OrderClient, WarehouseClient};
use crate::domain::{Order, WarehouseId};

use super::error::OrderLifecycleError;

/// How order numbers are allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberingStrategy {
    /// Latest number of today's orders plus one. Concurrent creates can collide.
    #[default]
    Scan,
    /// A per-(warehouse, day) counter behind a lock, seeded from the scan.
    Serialized,
}

impl FromStr for NumberingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scan" => Ok(NumberingStrategy::Scan),
            "serialized" => Ok(NumberingStrategy::Serialized),
            other => Err(format!("unknown numbering strategy: {}", other)),
        }
    }
}

type DailyCounters = HashMap<(WarehouseId, NaiveDate), u32>;

/// Computes sequential order numbers per warehouse within the local day.
#[derive(Clone)]
pub struct OrderNumberSequencer {
    warehouses: WarehouseClient,
    orders: OrderClient,
    strategy: NumberingStrategy,
    counters: Arc<Mutex<DailyCounters>>,
}

impl OrderNumberSequencer {
    pub fn new(warehouses: WarehouseClient, orders: OrderClient, strategy: NumberingStrategy) -> Self {
        Self {
            warehouses,
            orders,
            strategy,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn strategy(&self) -> NumberingStrategy {
        self.strategy
    }

    /// The number the next order of the warehouse would get. Allocates nothing.
    #[instrument(skip(self))]
    pub async fn next(&self, warehouse_id: &WarehouseId) -> Result<u32, OrderLifecycleError> {
        self.warehouses.require_warehouse(warehouse_id.clone()).await?;
        if self.strategy == NumberingStrategy::Serialized {
            let key = (warehouse_id.clone(), today());
            if let Some(last) = self.counters.lock().await.get(&key) {
                return Ok(last + 1);
            }
        }
        Ok(self.latest_today(warehouse_id).await? + 1)
    }

    /// Allocates the number for an order about to be persisted.
    #[instrument(skip(self))]
    pub async fn reserve(&self, warehouse_id: &WarehouseId) -> Result<u32, OrderLifecycleError> {
        match self.strategy {
            NumberingStrategy::Scan => self.next(warehouse_id).await,
            NumberingStrategy::Serialized => {
                self.warehouses.require_warehouse(warehouse_id.clone()).await?;
                let day = today();
                let mut counters = self.counters.lock().await;
                let key = (warehouse_id.clone(), day);
                let cached = counters.get(&key).copied();
                let number = match cached {
                    Some(last) => last + 1,
                    None => self.latest_today(warehouse_id).await? + 1,
                };
                counters.retain(|(_, counted_day), _| *counted_day == day);
                counters.insert(key, number);
                debug!(number, "Order number reserved");
                Ok(number)
            }
        }
    }

    /// Highest order number among today's non-deleted orders, 0 when there are none.
    async fn latest_today(&self, warehouse_id: &WarehouseId) -> Result<u32, OrderLifecycleError> {
        let since = start_of_day(Local::now());
        let warehouse_id = warehouse_id.clone();
        let latest = self
            .orders
            .query_orders(
                Query::all()
                    .filter(move |order: &Order| {
                        order.warehouse_id == warehouse_id && !order.is_deleted && order.created_at >= since
                    })
                    .sort_by(|a: &Order, b: &Order| b.order_number.cmp(&a.order_number))
                    .limit(1),
            )
            .await?;
        Ok(latest.first().map_or(0, |order| order.order_number))
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn start_of_day(now: DateTime<Local>) -> DateTime<Utc> {
    now.date_naive()
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        // Midnight skipped by a DST jump.
        .unwrap_or_else(|| now.with_timezone(&Utc))
}
