use crate::error::{ModelError, ModelResult, StoreError};
use crate::schema::EntityClass;
use crate::store::{Method, RemoteStore, StoreRequest, StoreResponse};
use crate::validation::ValidationErrors;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

const METADATA: &str = "metadata";

/// Where an entity instance sits in its persistence lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No identifier yet; never confirmed by the store.
    New,
    /// Addressable by uuid, name or username.
    Saved,
    /// Deleted from the store; the local attributes are gone.
    Deleted,
}

/// Local mirror of one record in the remote entity store.
///
/// Attributes are an open JSON map. The well-known keys (`uuid`, `name`,
/// `username`) have typed accessors; everything else is reached through
/// [`Entity::get`] and changed through [`Entity::update_attributes`].
/// Server bookkeeping (`metadata`) is held apart and never serialized.
#[derive(Debug, Clone)]
pub struct Entity {
    class: Arc<EntityClass>,
    attributes: Option<Map<String, Value>>,
    metadata: Option<Value>,
    errors: ValidationErrors,
    deleted: bool,
}

impl Entity {
    /// Creates an empty, unsaved entity of the given class.
    pub fn new(class: Arc<EntityClass>) -> Self {
        Self {
            class,
            attributes: None,
            metadata: None,
            errors: ValidationErrors::new(),
            deleted: false,
        }
    }

    /// Creates an entity holding `attributes`.
    pub fn with_attributes(class: Arc<EntityClass>, attributes: Map<String, Value>) -> Self {
        let mut entity = Self::new(class);
        entity.attributes = Some(Map::new());
        entity.merge_wire(attributes);
        entity
    }

    /// Materializes an entity from a record returned by the remote store.
    pub fn from_wire(class: Arc<EntityClass>, record: Value) -> ModelResult<Self> {
        match record {
            Value::Object(fields) => Ok(Self::with_attributes(class, fields)),
            other => Err(StoreError::InvalidResponse(format!(
                "expected an entity object for {}, got {other}",
                class.entity_type()
            ))
            .into()),
        }
    }

    pub fn class(&self) -> &Arc<EntityClass> {
        &self.class
    }

    pub fn entity_type(&self) -> &str {
        self.class.entity_type()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.as_ref().and_then(|attrs| attrs.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Empty strings read as absent.
    pub fn uuid(&self) -> Option<&str> {
        self.get_id_str("uuid")
    }

    pub fn name(&self) -> Option<&str> {
        self.get_id_str("name")
    }

    pub fn username(&self) -> Option<&str> {
        self.get_id_str("username")
    }

    /// The value the store addresses this record by: uuid, then name, then
    /// username.
    pub fn identifier(&self) -> Option<&str> {
        self.uuid()
            .or_else(|| self.name())
            .or_else(|| self.username())
    }

    /// Server bookkeeping attached to the last loaded record.
    pub fn metadata(&self) -> Option<&Value> {
        self.metadata.as_ref()
    }

    /// Attribute keys currently held, in map order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .flat_map(|attrs| attrs.keys().map(String::as_str))
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.deleted {
            Lifecycle::Deleted
        } else if self.identifier().is_some() {
            Lifecycle::Saved
        } else {
            Lifecycle::New
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Sets one attribute locally.
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.attributes
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Merges `attributes` into the local map, last write wins per key.
    /// Nothing is sent to the store until the next [`Entity::save`].
    pub fn update_attributes<I, K>(&mut self, attributes: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let attrs = self.attributes.get_or_insert_with(Map::new);
        for (key, value) in attributes {
            attrs.insert(key.into(), value);
        }
        self
    }

    // ── Validation ───────────────────────────────────────────────

    /// Re-runs every rule of this entity's class against the current
    /// attributes. Earlier errors are discarded first.
    pub fn validate(&mut self) -> &ValidationErrors {
        self.errors.clear();
        for (attribute, validators) in self.class.rules() {
            let value = self.get(&attribute);
            let failures: Vec<_> = validators
                .iter()
                .filter_map(|validator| validator(value))
                .collect();
            for failure in failures {
                self.errors.add(&attribute, failure);
            }
        }
        &self.errors
    }

    pub fn is_valid(&mut self) -> bool {
        !self.validate().has_errors()
    }

    /// Errors from the last [`Entity::validate`] run.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    // ── Serialization ────────────────────────────────────────────

    /// The attribute map as JSON, always without `metadata`.
    pub fn to_json(&self) -> Value {
        let attrs = self
            .attributes
            .iter()
            .flatten()
            .filter(|(key, _)| key.as_str() != METADATA)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Value::Object(attrs)
    }

    // ── Persistence ──────────────────────────────────────────────

    /// Validates, then creates or updates the record in the store.
    ///
    /// An invalid entity returns [`ModelError::Validation`] without touching
    /// the store. On success the returned record is merged into the local
    /// attributes, so server-assigned fields such as `uuid` become visible.
    pub async fn save<S: RemoteStore + ?Sized>(&mut self, store: &S) -> ModelResult<()> {
        self.ensure_live()?;
        if !self.is_valid() {
            debug!(entity = %self, errors = %self.errors, "refusing to save invalid entity");
            return Err(ModelError::Validation(self.errors.clone()));
        }

        let request = match self.uuid() {
            Some(uuid) => StoreRequest::put(
                format!("{}/{}", self.class.collection(), urlencoding::encode(uuid)),
                self.to_json(),
            ),
            None => StoreRequest::post(self.class.collection(), self.to_json()),
        };
        debug!(entity = %self, %request, "saving entity");

        let response = store.request(request).await?;
        let record = response.entities.into_iter().next().ok_or_else(|| {
            StoreError::InvalidResponse(format!(
                "save of {} returned no entity",
                self.class.entity_type()
            ))
        })?;
        match record {
            Value::Object(fields) => self.merge_wire(fields),
            other => {
                return Err(StoreError::InvalidResponse(format!(
                    "save of {} returned {other}",
                    self.class.entity_type()
                ))
                .into());
            }
        }
        info!(entity = %self, "entity saved");
        Ok(())
    }

    /// Deletes the record from the store and tombstones this instance.
    pub async fn delete<S: RemoteStore + ?Sized>(&mut self, store: &S) -> ModelResult<StoreResponse> {
        let path = self.path()?;
        let response = store.request(StoreRequest::delete(path)).await?;
        info!(entity = %self, "entity deleted");
        self.attributes = None;
        self.metadata = None;
        self.deleted = true;
        Ok(response)
    }

    /// Replaces the local attributes with the store's current record.
    pub async fn reload<S: RemoteStore + ?Sized>(&mut self, store: &S) -> ModelResult<()> {
        let path = self.path()?;
        let response = store.request(StoreRequest::get(path.clone())).await?;
        let record = response
            .entities
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound(path))?;
        let fresh = Self::from_wire(self.class.clone(), record)?;
        self.attributes = fresh.attributes;
        self.metadata = fresh.metadata;
        Ok(())
    }

    // ── Connections ──────────────────────────────────────────────

    /// Entities reached from this one over `relation`, materialized with
    /// this entity's own class, in the order the store returned them.
    pub async fn connections<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        relation: &str,
    ) -> ModelResult<Vec<Entity>> {
        let class = self.class.clone();
        self.connections_as(store, relation, &class).await
    }

    /// Like [`Entity::connections`] but materializes results with `class`.
    pub async fn connections_as<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        relation: &str,
        class: &Arc<EntityClass>,
    ) -> ModelResult<Vec<Entity>> {
        let path = format!("{}/{}", self.path()?, urlencoding::encode(relation));
        debug!(entity = %self, relation, "fetching connections");
        let response = store.request(StoreRequest::get(path)).await?;
        response
            .entities
            .into_iter()
            .map(|record| Self::from_wire(class.clone(), record))
            .collect()
    }

    /// Creates the edge `self -relation-> target`.
    pub async fn connect<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        relation: &str,
        target: &Entity,
    ) -> ModelResult<()> {
        let path = self.edge_path(relation, target)?;
        store
            .request(StoreRequest::new(Method::Post, path, None))
            .await?;
        info!(entity = %self, relation, target = %target, "connected");
        Ok(())
    }

    /// Removes the edge `self -relation-> target`.
    pub async fn disconnect<S: RemoteStore + ?Sized>(
        &self,
        store: &S,
        relation: &str,
        target: &Entity,
    ) -> ModelResult<()> {
        let path = self.edge_path(relation, target)?;
        store.request(StoreRequest::delete(path)).await?;
        info!(entity = %self, relation, target = %target, "disconnected");
        Ok(())
    }

    // ── Internals ────────────────────────────────────────────────

    fn ensure_live(&self) -> ModelResult<()> {
        if self.deleted {
            return Err(ModelError::Deleted {
                entity_type: self.entity_type().to_string(),
            });
        }
        Ok(())
    }

    /// `<collection>/<identifier>` for an addressable, live entity.
    fn path(&self) -> ModelResult<String> {
        self.ensure_live()?;
        let id = self
            .identifier()
            .ok_or_else(|| ModelError::MissingIdentifier {
                entity_type: self.entity_type().to_string(),
            })?;
        Ok(format!(
            "{}/{}",
            self.class.collection(),
            urlencoding::encode(id)
        ))
    }

    fn edge_path(&self, relation: &str, target: &Entity) -> ModelResult<String> {
        Ok(format!(
            "{}/{}/{}",
            self.path()?,
            urlencoding::encode(relation),
            target.path()?
        ))
    }

    fn get_id_str(&self, key: &str) -> Option<&str> {
        self.get_str(key).filter(|id| !id.is_empty())
    }

    fn merge_wire(&mut self, mut fields: Map<String, Value>) {
        if let Some(metadata) = fields.remove(METADATA) {
            self.metadata = Some(metadata);
        }
        self.update_attributes(fields);
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attributes.is_none() {
            return f.write_str("{}");
        }
        f.write_str(self.entity_type())?;
        let label = self.name().or_else(|| self.identifier());
        write!(f, "[{}]", label.unwrap_or_default())
    }
}

impl Serialize for Entity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
