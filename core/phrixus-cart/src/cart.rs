use crate::entity_newtype;
use phrixus_model::{Entity, Model};
use serde_json::json;

const STATUS: &str = "status";

/// Whether a cart still accepts changes from its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartStatus {
    Open,
    Closed,
}

impl CartStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Open => "open",
            CartStatus::Closed => "closed",
        }
    }
}

/// A shopping cart.
#[derive(Debug, Clone)]
pub struct Cart(Entity);

entity_newtype!(Cart);

impl Model for Cart {
    const ENTITY_TYPE: &'static str = "cart";
    const COLLECTION: &'static str = "carts";

    fn from_entity(entity: Entity) -> Self {
        Cart(entity)
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

impl Cart {
    /// Carts without a `status` attribute are open.
    pub fn status(&self) -> CartStatus {
        match self.0.get_str(STATUS) {
            Some("closed") => CartStatus::Closed,
            _ => CartStatus::Open,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status() == CartStatus::Closed
    }

    /// Marks the cart closed locally. The record stays in the store;
    /// [`Entity::save`] persists the change.
    pub fn close(&mut self) -> &mut Self {
        self.0.set(STATUS, json!(CartStatus::Closed.as_str()));
        self
    }
}
