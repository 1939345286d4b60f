use tracing::{debug, instrument};

use crate::actor_framework::ResourceClient;
use crate::domain::{User, UserCreate, UserId, UserUpdate};
use crate::user_actor::UserError;

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<User>,
}

impl_basic_client!(UserClient, User, UserId, UserError, user);

impl UserClient {
    #[instrument(skip(self))]
    pub async fn create_user(&self, user: UserCreate) -> Result<UserId, UserError> {
        debug!("Sending request");
        let user = self.inner.create(user).await?;
        Ok(user.id)
    }

    #[instrument(skip(self))]
    pub async fn update_user(&self, id: UserId, update: UserUpdate) -> Result<User, UserError> {
        debug!("Sending request");
        Ok(self.inner.update(id, update).await?)
    }
}
