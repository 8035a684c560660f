use crate::cart::Cart;
use crate::error::{ServiceError, ServiceResult};
use crate::user::User;
use phrixus_model::{Registry, RemoteStore, collection};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// Keys the store owns. Callers cannot set them through the service.
const PROTECTED_KEYS: [&str; 3] = ["uuid", "type", "metadata"];

/// Drops [`PROTECTED_KEYS`] from caller-supplied attributes, so an edit
/// always lands on the record it was addressed to.
fn editable(mut attributes: Map<String, Value>) -> Map<String, Value> {
    for key in PROTECTED_KEYS {
        if attributes.remove(key).is_some() {
            debug!(key, "ignoring protected attribute");
        }
    }
    attributes
}

/// Cart operations behind the HTTP layer.
///
/// Two scopes are offered. The generic scope works on any cart in the
/// collection and "closes" a cart by flagging its status. The owner scope
/// works only on carts connected to a user and removes a cart by severing
/// that connection, after which the owner can no longer see it.
#[derive(Clone)]
pub struct CartService {
    registry: Arc<Registry>,
    store: Arc<dyn RemoteStore>,
}

impl CartService {
    pub fn new(registry: Arc<Registry>, store: Arc<dyn RemoteStore>) -> Self {
        Self { registry, store }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &dyn RemoteStore {
        self.store.as_ref()
    }

    // ── Generic scope ────────────────────────────────────────────

    /// All carts, or those matching `filter` (a where-clause such as
    /// `uuid=<id>`).
    pub async fn list(&self, filter: Option<&str>) -> ServiceResult<Vec<Cart>> {
        let ql = filter
            .filter(|f| !f.trim().is_empty())
            .map(|f| format!("select * where {f}"));
        let carts =
            collection::query::<Cart, _>(&self.registry, self.store(), ql.as_deref(), None)
                .await?;
        Ok(carts)
    }

    pub async fn get(&self, id: &str) -> ServiceResult<Cart> {
        collection::find::<Cart, _>(&self.registry, self.store(), id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("cart {id}")))
    }

    pub async fn create(&self, attributes: Map<String, Value>) -> ServiceResult<Cart> {
        let cart: Cart =
            collection::create(&self.registry, self.store(), editable(attributes)).await?;
        info!(cart = %cart, "cart created");
        Ok(cart)
    }

    pub async fn update(&self, id: &str, attributes: Map<String, Value>) -> ServiceResult<Cart> {
        let mut cart = self.get(id).await?;
        cart.update_attributes(editable(attributes));
        cart.save(self.store()).await?;
        Ok(cart)
    }

    /// Soft close: sets `status` to `closed`. The cart remains fetchable.
    pub async fn close(&self, id: &str) -> ServiceResult<Cart> {
        let mut cart = self.get(id).await?;
        cart.close();
        cart.save(self.store()).await?;
        info!(cart = %cart, "cart closed");
        Ok(cart)
    }

    // ── Owner scope ──────────────────────────────────────────────

    async fn owner(&self, username: &str) -> ServiceResult<User> {
        collection::find::<User, _>(&self.registry, self.store(), username)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("user {username}")))
    }

    async fn owned(&self, user: &User, id: &str) -> ServiceResult<Cart> {
        user.carts(&self.registry, self.store())
            .await?
            .into_iter()
            .find(|cart| cart.uuid() == Some(id) || cart.name() == Some(id))
            .ok_or_else(|| ServiceError::NotFound(format!("cart {id}")))
    }

    /// The user named `username`, created if the store has none.
    pub async fn ensure_user(&self, username: &str) -> ServiceResult<User> {
        if let Some(user) =
            collection::find::<User, _>(&self.registry, self.store(), username).await?
        {
            return Ok(user);
        }
        let mut attributes = Map::new();
        attributes.insert("username".into(), Value::String(username.to_string()));
        let user: User = collection::create(&self.registry, self.store(), attributes).await?;
        info!(user = %user, "user created");
        Ok(user)
    }

    /// Carts connected to `owner`.
    pub async fn list_owned(&self, owner: &str) -> ServiceResult<Vec<Cart>> {
        let user = self.owner(owner).await?;
        Ok(user.carts(&self.registry, self.store()).await?)
    }

    /// A cart connected to `owner`. Carts that exist but belong to someone
    /// else are reported as not found.
    pub async fn get_owned(&self, owner: &str, id: &str) -> ServiceResult<Cart> {
        let user = self.owner(owner).await?;
        self.owned(&user, id).await
    }

    /// Creates a cart and connects it to `owner`.
    pub async fn create_owned(
        &self,
        owner: &str,
        attributes: Map<String, Value>,
    ) -> ServiceResult<Cart> {
        let user = self.owner(owner).await?;
        let cart = self.create(attributes).await?;
        user.add_cart(self.store(), &cart).await?;
        Ok(cart)
    }

    pub async fn update_owned(
        &self,
        owner: &str,
        id: &str,
        attributes: Map<String, Value>,
    ) -> ServiceResult<Cart> {
        let user = self.owner(owner).await?;
        let mut cart = self.owned(&user, id).await?;
        cart.update_attributes(editable(attributes));
        cart.save(self.store()).await?;
        Ok(cart)
    }

    /// Severs the connection between `owner` and the cart. The cart record
    /// itself is left in the collection.
    pub async fn remove_owned(&self, owner: &str, id: &str) -> ServiceResult<Cart> {
        let user = self.owner(owner).await?;
        let cart = self.owned(&user, id).await?;
        user.remove_cart(self.store(), &cart).await?;
        info!(cart = %cart, owner, "cart removed from owner");
        Ok(cart)
    }
}
