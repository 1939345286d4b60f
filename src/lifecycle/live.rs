//! Live order listings.
//!
//! A feed emits the current result immediately and refetches on every trigger.
//! Only one fetch runs at a time; triggers arriving meanwhile collapse into a
//! single trailing fetch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::debug;

use super::error::OrderLifecycleError;
use super::existence::ExistenceEventFilter;
use super::manager::OrderView;

pub type OrderListing = Result<Vec<OrderView>, OrderLifecycleError>;

pub(crate) fn spawn_refetch_loop<E, T, F, Fut>(
    mut triggers: broadcast::Receiver<E>,
    buffer: usize,
    mut fetch: F,
) -> (mpsc::Receiver<T>, JoinHandle<()>)
where
    E: Clone + Send + 'static,
    T: Send + 'static,
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = T> + Send,
{
    let (sender, receiver) = mpsc::channel(buffer);
    let task = tokio::spawn(async move {
        if sender.send(fetch().await).await.is_err() {
            return;
        }
        loop {
            match triggers.recv().await {
                Ok(_) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
            // Everything queued up during the last fetch is served by the next one.
            loop {
                match triggers.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
            if sender.send(fetch().await).await.is_err() {
                break;
            }
        }
        debug!("Live feed stopped");
    });
    (receiver, task)
}

/// A live listing of one warehouse's orders. Dropping it stops the feed.
pub struct LiveOrders {
    receiver: mpsc::Receiver<OrderListing>,
    task: JoinHandle<()>,
    _filter: Arc<ExistenceEventFilter>,
}

impl LiveOrders {
    pub(crate) fn new(receiver: mpsc::Receiver<OrderListing>, task: JoinHandle<()>, filter: Arc<ExistenceEventFilter>) -> Self {
        Self {
            receiver,
            task,
            _filter: filter,
        }
    }

    /// Waits for the next emission. `None` once the upstream order stream has
    /// closed and the warehouse filter has stopped forwarding.
    pub async fn next(&mut self) -> Option<OrderListing> {
        self.receiver.recv().await
    }
}

impl Drop for LiveOrders {
    fn drop(&mut self) {
        self.task.abort();
    }
}
