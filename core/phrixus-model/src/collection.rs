//! Collection-level operations for any [`Model`].
//!
//! These address a whole collection (or a record by id) rather than an
//! instance already in hand.

use crate::entity::Entity;
use crate::error::{ModelResult, StoreError};
use crate::model::Model;
use crate::registry::Registry;
use crate::store::{RemoteStore, StoreRequest};
use serde_json::{Map, Value};
use tracing::debug;

/// Fetches one record by uuid, name or username. A missing record is
/// `Ok(None)`.
pub async fn find<M, S>(registry: &Registry, store: &S, id: &str) -> ModelResult<Option<M>>
where
    M: Model,
    S: RemoteStore + ?Sized,
{
    let class = registry.class_of::<M>()?;
    let endpoint = format!("{}/{}", class.collection(), urlencoding::encode(id));
    let response = match store.request(StoreRequest::get(endpoint)).await {
        Ok(response) => response,
        Err(StoreError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    response
        .entities
        .into_iter()
        .next()
        .map(|record| Entity::from_wire(class.clone(), record).map(M::from_entity))
        .transpose()
}

/// Lists records, optionally filtered by a query-language statement such as
/// `select * where uuid=...`. Results keep the store's order.
pub async fn query<M, S>(
    registry: &Registry,
    store: &S,
    ql: Option<&str>,
    limit: Option<usize>,
) -> ModelResult<Vec<M>>
where
    M: Model,
    S: RemoteStore + ?Sized,
{
    let class = registry.class_of::<M>()?;
    let mut request = StoreRequest::get(class.collection());
    if let Some(ql) = ql {
        request = request.with_query("ql", ql);
    }
    if let Some(limit) = limit {
        request = request.with_query("limit", limit.to_string());
    }
    debug!(collection = class.collection(), ql, "querying collection");
    let response = store.request(request).await?;
    response
        .entities
        .into_iter()
        .map(|record| Entity::from_wire(class.clone(), record).map(M::from_entity))
        .collect()
}

/// Builds a new `M` from `attributes` and saves it.
pub async fn create<M, S>(
    registry: &Registry,
    store: &S,
    attributes: Map<String, Value>,
) -> ModelResult<M>
where
    M: Model,
    S: RemoteStore + ?Sized,
{
    let mut model: M = registry.new_model(attributes)?;
    model.entity_mut().save(store).await?;
    Ok(model)
}

/// Deletes a record by uuid, name or username without loading it first.
pub async fn delete_by_id<M, S>(registry: &Registry, store: &S, id: &str) -> ModelResult<()>
where
    M: Model,
    S: RemoteStore + ?Sized,
{
    let class = registry.class_of::<M>()?;
    let endpoint = format!("{}/{}", class.collection(), urlencoding::encode(id));
    store.request(StoreRequest::delete(endpoint)).await?;
    Ok(())
}

/// Traverses `relation` from `model`, materializing results as `M`.
pub async fn connections<M, S>(model: &M, store: &S, relation: &str) -> ModelResult<Vec<M>>
where
    M: Model,
    S: RemoteStore + ?Sized,
{
    let entities = model.entity().connections(store, relation).await?;
    Ok(entities.into_iter().map(M::from_entity).collect())
}
