use crate::entity::Entity;
use crate::schema::EntityClass;

/// Implemented by every domain type built on [`Entity`].
///
/// A model is a thin wrapper: it names its remote type and collection,
/// declares its validation rules once in [`Model::define`], and adds
/// whatever type-specific operations it needs on top of the wrapped entity.
/// Registering the model with a [`Registry`](crate::Registry) produces the
/// single shared [`EntityClass`] all its instances use.
pub trait Model: Sized + Send + Sync {
    /// The remote `type` value.
    const ENTITY_TYPE: &'static str;

    /// The collection path records of this type live under.
    const COLLECTION: &'static str;

    /// Adds this type's validation rules to a fresh class.
    fn define(class: EntityClass) -> EntityClass {
        class
    }

    fn from_entity(entity: Entity) -> Self;

    fn entity(&self) -> &Entity;

    fn entity_mut(&mut self) -> &mut Entity;

    fn into_entity(self) -> Entity;
}
