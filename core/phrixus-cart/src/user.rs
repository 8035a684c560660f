use crate::cart::Cart;
use crate::entity_newtype;
use phrixus_model::{
    Entity, EntityClass, Model, ModelError, ModelResult, Registry, RemoteStore, StoreError,
    StoreRequest, validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

const CARTS: &str = "carts";

/// Token granted by the remote store for a user's password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    /// The user record the store returned alongside the token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

/// An application user. Owns carts through the `carts` connection.
#[derive(Debug, Clone)]
pub struct User(Entity);

entity_newtype!(User);

impl Model for User {
    const ENTITY_TYPE: &'static str = "user";
    const COLLECTION: &'static str = "users";

    fn define(class: EntityClass) -> EntityClass {
        class.validates("username", vec![validation::required])
    }

    fn from_entity(entity: Entity) -> Self {
        User(entity)
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

impl User {
    /// Exchanges this user's username and `password` for an access token.
    pub async fn access_token<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        password: &str,
    ) -> ModelResult<AccessToken> {
        let username = self
            .0
            .username()
            .ok_or_else(|| ModelError::MissingIdentifier {
                entity_type: self.0.entity_type().to_string(),
            })?;
        debug!(username, "requesting access token");

        let body = json!({
            "username": username,
            "password": password,
            "grant_type": "password",
        });
        let response = store.request(StoreRequest::post("token", body)).await?;
        let token =
            serde_json::from_value(Value::Object(response.extra)).map_err(StoreError::from)?;
        Ok(token)
    }

    /// Carts connected to this user, in store order.
    pub async fn carts<S: RemoteStore + ?Sized>(
        &self,
        registry: &Registry,
        store: &S,
    ) -> ModelResult<Vec<Cart>> {
        let class = registry.class_of::<Cart>()?;
        let entities = self.0.connections_as(store, CARTS, class).await?;
        Ok(entities.into_iter().map(Cart::from_entity).collect())
    }

    pub async fn add_cart<S: RemoteStore + ?Sized>(&self, store: &S, cart: &Cart) -> ModelResult<()> {
        self.0.connect(store, CARTS, cart.entity()).await
    }

    pub async fn remove_cart<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        cart: &Cart,
    ) -> ModelResult<()> {
        self.0.disconnect(store, CARTS, cart.entity()).await
    }
}
