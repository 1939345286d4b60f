use crate::actor_framework::Entity;
use crate::domain::{User, UserCreate, UserId, UserUpdate};

impl Entity for User {
    type Id = UserId;
    type CreateParams = UserCreate;
    type UpdateParams = UserUpdate;
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &UserId {
        &self.id
    }

    /// Creates a new User from creation parameters.
    ///
    /// # Arguments
    /// * `id` - Unique identifier for the user
    /// * `params` - User creation parameters containing name and email
    fn from_create_params(id: UserId, params: UserCreate) -> Result<Self, String> {
        if !params.email.contains('@') {
            return Err(format!("Invalid email address: {}", params.email));
        }
        Ok(Self {
            id,
            name: params.name,
            email: params.email,
        })
    }

    /// Updates the user's profile information.
    fn on_update(&mut self, update: UserUpdate) -> Result<(), String> {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
