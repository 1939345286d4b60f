use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductId, ProductUpdate};

impl Entity for Product {
    type Id = ProductId;
    type CreateParams = ProductCreate;
    type UpdateParams = ProductUpdate;
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn from_create_params(id: ProductId, params: ProductCreate) -> Result<Self, String> {
        if params.title.trim().is_empty() {
            return Err("Product title must not be empty".to_string());
        }
        Ok(Self {
            id,
            title: params.title,
            description: params.description,
        })
    }

    /// Updates the product's title and/or description.
    fn on_update(&mut self, update: ProductUpdate) -> Result<(), String> {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
