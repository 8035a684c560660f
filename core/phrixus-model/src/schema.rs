use crate::validation::Validator;
use std::sync::{PoisonError, RwLock};

/// Describes one remote entity type: where its records live and which
/// attributes must pass which validators before a save.
///
/// Every instance of the type holds the same `Arc<EntityClass>`, so rules
/// appended with [`EntityClass::add_rule`] apply to existing instances too.
#[derive(Debug)]
pub struct EntityClass {
    entity_type: String,
    collection: String,
    rules: RwLock<Vec<(String, Vec<Validator>)>>,
}

impl EntityClass {
    pub fn new(entity_type: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            collection: collection.into(),
            rules: RwLock::new(Vec::new()),
        }
    }

    /// Declares the validators for `attribute`, replacing any earlier
    /// declaration but keeping its position.
    pub fn validates(mut self, attribute: &str, validators: Vec<Validator>) -> Self {
        let rules = self
            .rules
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        match rules.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, existing)) => *existing = validators,
            None => rules.push((attribute.to_string(), validators)),
        }
        self
    }

    /// Appends a validator for `attribute` on an already shared class.
    pub fn add_rule(&self, attribute: &str, validator: Validator) {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        match rules.iter_mut().find(|(name, _)| name == attribute) {
            Some((_, existing)) => existing.push(validator),
            None => rules.push((attribute.to_string(), vec![validator])),
        }
    }

    /// The remote `type` value, e.g. `cart`.
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The collection path records live under, e.g. `carts`.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Snapshot of the current rules in declaration order.
    pub fn rules(&self) -> Vec<(String, Vec<Validator>)> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Attribute names that carry at least one rule.
    pub fn validated_attributes(&self) -> Vec<String> {
        self.rules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}
