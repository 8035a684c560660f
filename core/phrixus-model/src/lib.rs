//! Remote entity mapping for Phrixus.
//!
//! Turns open attribute bags into validated, persistable objects backed by a
//! remote entity-graph store:
//! - [`Entity`]: the attribute container with save/delete/connection lifecycle
//! - [`EntityClass`]: one entity type's collection path and validation rules
//! - [`Registry`]: the set of classes known to the process, built once at startup
//! - [`Model`]: the trait domain types implement to wrap an [`Entity`]
//! - [`RemoteStore`]: the seam the network client plugs into
//!
//! The store client itself lives outside this crate; everything here only
//! shapes requests and interprets responses.

pub mod collection;
mod entity;
mod error;
mod model;
mod registry;
mod schema;
mod store;
pub mod validation;

pub use entity::{Entity, Lifecycle};
pub use error::{ModelError, ModelResult, StoreError, StoreResult};
pub use model::Model;
pub use registry::{Registry, RegistryBuilder};
pub use schema::EntityClass;
pub use store::{Method, RemoteStore, StoreRequest, StoreResponse};
pub use validation::{FieldError, ValidationErrors, Validator};
