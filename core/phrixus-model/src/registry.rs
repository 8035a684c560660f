use crate::entity::Entity;
use crate::error::{ModelError, ModelResult, StoreError};
use crate::model::Model;
use crate::schema::EntityClass;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// The entity classes known to the process.
///
/// Built once at startup with [`Registry::builder`] and then shared
/// read-only (typically as `Arc<Registry>`) with everything that constructs
/// or persists entities.
#[derive(Debug, Default)]
pub struct Registry {
    classes: HashMap<String, Arc<EntityClass>>,
}

/// Collects class definitions before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    classes: HashMap<String, Arc<EntityClass>>,
    duplicate: Option<String>,
}

impl RegistryBuilder {
    /// Registers a model type with the rules from its [`Model::define`].
    pub fn register<M: Model>(self) -> Self {
        self.register_class(M::define(EntityClass::new(M::ENTITY_TYPE, M::COLLECTION)))
    }

    /// Registers a class built by hand.
    pub fn register_class(mut self, class: EntityClass) -> Self {
        let entity_type = class.entity_type().to_string();
        if self.classes.contains_key(&entity_type) {
            self.duplicate.get_or_insert(entity_type);
            return self;
        }
        debug!(entity_type = %entity_type, collection = class.collection(), "registered entity class");
        self.classes.insert(entity_type, Arc::new(class));
        self
    }

    /// Freezes the registry. Fails if any type was registered twice.
    pub fn build(self) -> ModelResult<Registry> {
        if let Some(entity_type) = self.duplicate {
            return Err(ModelError::DuplicateType(entity_type));
        }
        Ok(Registry {
            classes: self.classes,
        })
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// The shared class for `entity_type`.
    pub fn class(&self, entity_type: &str) -> ModelResult<&Arc<EntityClass>> {
        self.classes
            .get(entity_type)
            .ok_or_else(|| ModelError::UnknownType(entity_type.to_string()))
    }

    /// The shared class for model `M`.
    pub fn class_of<M: Model>(&self) -> ModelResult<&Arc<EntityClass>> {
        self.class(M::ENTITY_TYPE)
    }

    pub fn contains(&self, entity_type: &str) -> bool {
        self.classes.contains_key(entity_type)
    }

    /// Registered type names, sorted.
    pub fn entity_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    /// A new, unsaved `M` holding `attributes`.
    pub fn new_model<M: Model>(&self, attributes: Map<String, Value>) -> ModelResult<M> {
        let class = self.class_of::<M>()?.clone();
        Ok(M::from_entity(Entity::with_attributes(class, attributes)))
    }

    /// An `M` materialized from a store record.
    pub fn load<M: Model>(&self, record: Value) -> ModelResult<M> {
        let class = self.class_of::<M>()?.clone();
        Entity::from_wire(class, record).map(M::from_entity)
    }

    /// An entity materialized from a store record, classed by its `type`.
    pub fn load_entity(&self, record: Value) -> ModelResult<Entity> {
        let entity_type = record
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidResponse("record has no type".to_string()))?;
        let class = self.class(entity_type)?.clone();
        Entity::from_wire(class, record)
    }
}
