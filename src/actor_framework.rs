use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

// =============================================================================
// 1. THE ABSTRACTION (Traits with Hooks, Params, and Actions)
// =============================================================================

/// Trait that any stored entity must implement to be managed by [`ResourceActor`].
pub trait Entity: Clone + Send + Sync + 'static {
    type Id: Eq + Hash + Clone + Send + Sync + Display + Debug;
    type CreateParams: Send + Sync + Debug;
    type UpdateParams: Send + Sync + Debug;

    type Action: Send + Sync + Debug;
    type ActionResult: Send + Sync + Debug;

    fn id(&self) -> &Self::Id;

    /// Construct the full entity from the generated id and the creation params.
    fn from_create_params(id: Self::Id, params: Self::CreateParams) -> Result<Self, String>;

    // --- Lifecycle Hooks ---

    fn on_create(&mut self) -> Result<(), String> {
        Ok(())
    }
    fn on_update(&mut self, update: Self::UpdateParams) -> Result<(), String>;
    fn on_delete(&self) -> Result<(), String> {
        Ok(())
    }

    // --- Action Handler ---

    /// Handle a domain-specific action. Runs against a copy of the entity that is
    /// committed only when the action succeeds.
    fn handle_action(&mut self, action: Self::Action) -> Result<Self::ActionResult, String>;

    /// Whether an action outcome changed the entity. Outcomes reported as unchanged
    /// are neither committed nor published.
    fn is_mutation(_result: &Self::ActionResult) -> bool {
        true
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped the response")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Rejected: {0}")]
    Rejected(String),
}

// =============================================================================
// 2. EXISTENCE EVENTS
// =============================================================================

/// Change notification published by a [`ResourceActor`] after every successful write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExistenceEvent<T> {
    Created { value: T },
    Updated { value: T, last_value: T },
    Removed { last_value: T },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExistenceEventKind {
    Created,
    Updated,
    Removed,
}

impl<T> ExistenceEvent<T> {
    pub fn kind(&self) -> ExistenceEventKind {
        match self {
            ExistenceEvent::Created { .. } => ExistenceEventKind::Created,
            ExistenceEvent::Updated { .. } => ExistenceEventKind::Updated,
            ExistenceEvent::Removed { .. } => ExistenceEventKind::Removed,
        }
    }

    /// The value after the write, if the entity still exists.
    pub fn value(&self) -> Option<&T> {
        match self {
            ExistenceEvent::Created { value } | ExistenceEvent::Updated { value, .. } => Some(value),
            ExistenceEvent::Removed { .. } => None,
        }
    }

    /// The value before the write, if the entity existed.
    pub fn last_value(&self) -> Option<&T> {
        match self {
            ExistenceEvent::Updated { last_value, .. } | ExistenceEvent::Removed { last_value } => {
                Some(last_value)
            }
            ExistenceEvent::Created { .. } => None,
        }
    }
}

// =============================================================================
// 3. QUERIES
// =============================================================================

type Predicate<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering + Send + Sync>;

/// Filter, sort and pagination evaluated inside the actor against its store.
pub struct Query<T> {
    predicate: Option<Predicate<T>>,
    comparator: Option<Comparator<T>>,
    skip: usize,
    limit: Option<usize>,
}

impl<T> Query<T> {
    pub fn all() -> Self {
        Self {
            predicate: None,
            comparator: None,
            skip: 0,
            limit: None,
        }
    }

    pub fn filter(mut self, predicate: impl Fn(&T) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn sort_by(mut self, comparator: impl Fn(&T, &T) -> Ordering + Send + Sync + 'static) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, item: &T) -> bool {
        self.predicate.as_ref().map_or(true, |predicate| predicate(item))
    }

    fn run<'a>(&self, items: impl Iterator<Item = &'a T>) -> Vec<T>
    where
        T: Clone + 'a,
    {
        let mut selected: Vec<T> = items.filter(|item| self.matches(item)).cloned().collect();
        if let Some(comparator) = &self.comparator {
            selected.sort_by(|a, b| comparator(a, b));
        }
        selected
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Self::all()
    }
}

impl<T> Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filtered", &self.predicate.is_some())
            .field("sorted", &self.comparator.is_some())
            .field("skip", &self.skip)
            .field("limit", &self.limit)
            .finish()
    }
}

// =============================================================================
// 4. THE GENERIC MESSAGES
// =============================================================================

pub type Response<T> = oneshot::Sender<Result<T, FrameworkError>>;

#[derive(Debug)]
pub enum ResourceRequest<T: Entity> {
    Create {
        params: T::CreateParams,
        respond_to: Response<T>,
    },
    Get {
        id: T::Id,
        respond_to: Response<Option<T>>,
    },
    Update {
        id: T::Id,
        update: T::UpdateParams,
        respond_to: Response<T>,
    },
    Delete {
        id: T::Id,
        respond_to: Response<()>,
    },
    Action {
        id: T::Id,
        action: T::Action,
        respond_to: Response<T::ActionResult>,
    },
    Query {
        query: Query<T>,
        respond_to: Response<Vec<T>>,
    },
}

// =============================================================================
// 5. THE GENERIC ACTOR SERVER
// =============================================================================

pub struct ResourceActor<T: Entity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, T>,
    next_id_fn: Box<dyn Fn() -> T::Id + Send + Sync>,
    existence: Option<broadcast::Sender<ExistenceEvent<T>>>,
}

impl<T: Entity> ResourceActor<T> {
    pub fn new(
        buffer_size: usize,
        next_id_fn: impl Fn() -> T::Id + Send + Sync + 'static,
    ) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id_fn: Box::new(next_id_fn),
            existence: None,
        };
        let client = ResourceClient { sender };
        (actor, client)
    }

    /// Publish an [`ExistenceEvent`] to `sender` after every successful write.
    pub fn publish_existence(mut self, sender: broadcast::Sender<ExistenceEvent<T>>) -> Self {
        self.existence = Some(sender);
        self
    }

    pub async fn run(mut self) {
        debug!(entity = std::any::type_name::<T>(), "ResourceActor starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create { params, respond_to } => {
                    let id = (self.next_id_fn)();
                    let created = T::from_create_params(id, params).and_then(|mut item| {
                        item.on_create()?;
                        Ok(item)
                    });
                    match created {
                        Ok(item) => {
                            self.store.insert(item.id().clone(), item.clone());
                            publish(&self.existence, ExistenceEvent::Created { value: item.clone() });
                            let _ = respond_to.send(Ok(item));
                        }
                        Err(e) => {
                            let _ = respond_to.send(Err(FrameworkError::Rejected(e)));
                        }
                    }
                }
                ResourceRequest::Get { id, respond_to } => {
                    let item = self.store.get(&id).cloned();
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Update { id, update, respond_to } => {
                    let outcome = match self.store.get_mut(&id) {
                        Some(item) => {
                            let mut candidate = item.clone();
                            match candidate.on_update(update) {
                                Ok(()) => {
                                    let last_value = std::mem::replace(item, candidate);
                                    Ok((item.clone(), last_value))
                                }
                                Err(e) => Err(FrameworkError::Rejected(e)),
                            }
                        }
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    match outcome {
                        Ok((value, last_value)) => {
                            publish(
                                &self.existence,
                                ExistenceEvent::Updated { value: value.clone(), last_value },
                            );
                            let _ = respond_to.send(Ok(value));
                        }
                        Err(e) => {
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                ResourceRequest::Delete { id, respond_to } => {
                    let checked = match self.store.get(&id) {
                        Some(item) => item.on_delete().map_err(FrameworkError::Rejected),
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    if let Err(e) = checked {
                        let _ = respond_to.send(Err(e));
                        continue;
                    }
                    if let Some(last_value) = self.store.remove(&id) {
                        publish(&self.existence, ExistenceEvent::Removed { last_value });
                    }
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::Action { id, action, respond_to } => {
                    let outcome = match self.store.get_mut(&id) {
                        Some(item) => {
                            let mut candidate = item.clone();
                            match candidate.handle_action(action) {
                                Ok(result) if T::is_mutation(&result) => {
                                    let last_value = std::mem::replace(item, candidate);
                                    Ok((result, Some((item.clone(), last_value))))
                                }
                                Ok(result) => Ok((result, None)),
                                Err(e) => Err(FrameworkError::Rejected(e)),
                            }
                        }
                        None => Err(FrameworkError::NotFound(id.to_string())),
                    };
                    match outcome {
                        Ok((result, change)) => {
                            if let Some((value, last_value)) = change {
                                publish(&self.existence, ExistenceEvent::Updated { value, last_value });
                            }
                            let _ = respond_to.send(Ok(result));
                        }
                        Err(e) => {
                            let _ = respond_to.send(Err(e));
                        }
                    }
                }
                ResourceRequest::Query { query, respond_to } => {
                    let items = query.run(self.store.values());
                    let _ = respond_to.send(Ok(items));
                }
            }
        }
        debug!(entity = std::any::type_name::<T>(), "ResourceActor stopped");
    }
}

fn publish<T>(existence: &Option<broadcast::Sender<ExistenceEvent<T>>>, event: ExistenceEvent<T>) {
    if let Some(sender) = existence {
        // No subscribers is not an error.
        let _ = sender.send(event);
    }
}

// =============================================================================
// 6. THE GENERIC CLIENT
// =============================================================================

#[derive(Clone)]
pub struct ResourceClient<T: Entity> {
    sender: mpsc::Sender<ResourceRequest<T>>,
}

impl<T: Entity> ResourceClient<T> {
    #[cfg(test)]
    pub(crate) fn new(sender: mpsc::Sender<ResourceRequest<T>>) -> Self {
        Self { sender }
    }

    async fn request<R>(
        &self,
        build: impl FnOnce(Response<R>) -> ResourceRequest<T>,
    ) -> Result<R, FrameworkError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(build(respond_to))
            .await
            .map_err(|_| FrameworkError::ActorClosed)?;
        response.await.map_err(|_| FrameworkError::ActorDropped)?
    }

    pub async fn create(&self, params: T::CreateParams) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Create { params, respond_to }).await
    }

    pub async fn get(&self, id: T::Id) -> Result<Option<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Get { id, respond_to }).await
    }

    pub async fn update(&self, id: T::Id, update: T::UpdateParams) -> Result<T, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Update { id, update, respond_to }).await
    }

    pub async fn delete(&self, id: T::Id) -> Result<(), FrameworkError> {
        self.request(|respond_to| ResourceRequest::Delete { id, respond_to }).await
    }

    pub async fn perform_action(&self, id: T::Id, action: T::Action) -> Result<T::ActionResult, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Action { id, action, respond_to }).await
    }

    pub async fn query(&self, query: Query<T>) -> Result<Vec<T>, FrameworkError> {
        self.request(|respond_to| ResourceRequest::Query { query, respond_to }).await
    }
}

// =============================================================================
// 7. EXAMPLE USAGE (Test)
// =============================================================================
