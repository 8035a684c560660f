use crate::entity_newtype;
use phrixus_model::{Entity, EntityClass, Model, validation};

/// One product line in a cart.
#[derive(Debug, Clone)]
pub struct CartItem(Entity);

entity_newtype!(CartItem);

impl Model for CartItem {
    const ENTITY_TYPE: &'static str = "cartitem";
    const COLLECTION: &'static str = "cartitems";

    fn define(class: EntityClass) -> EntityClass {
        class
            .validates("cart", vec![validation::required])
            .validates("product", vec![validation::required, validation::string])
            .validates("quantity", vec![validation::positive_number])
    }

    fn from_entity(entity: Entity) -> Self {
        CartItem(entity)
    }

    fn entity(&self) -> &Entity {
        &self.0
    }

    fn entity_mut(&mut self) -> &mut Entity {
        &mut self.0
    }

    fn into_entity(self) -> Entity {
        self.0
    }
}

impl CartItem {
    /// Uuid of the cart this item belongs to.
    pub fn cart_id(&self) -> Option<&str> {
        self.0.get_str("cart")
    }

    pub fn product(&self) -> Option<&str> {
        self.0.get_str("product")
    }

    /// Defaults to one when unset.
    pub fn quantity(&self) -> f64 {
        self.0
            .get("quantity")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(1.0)
    }
}
