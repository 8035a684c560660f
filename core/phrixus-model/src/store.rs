//! The remote store seam.
//!
//! Entities never talk to the network directly. They build a
//! [`StoreRequest`] and hand it to whatever [`RemoteStore`] the caller
//! supplies, then interpret the [`StoreResponse`].

use crate::error::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// HTTP-like verb understood by the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One call against the remote store, relative to the application root.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub method: Method,
    /// Path below the application root, e.g. `carts/<uuid>`.
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl StoreRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, body: Option<Value>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint, None)
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, endpoint, Some(body))
    }

    pub fn put(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, endpoint, Some(body))
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint, None)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

impl fmt::Display for StoreRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} /{}", self.method, self.endpoint)
    }
}

/// Response envelope returned by the remote store.
///
/// Collection and entity calls carry their results in `entities`; anything
/// else the store sends (token grants, cursors, counts) lands in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreResponse {
    #[serde(default)]
    pub entities: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoreResponse {
    pub fn with_entities(entities: Vec<Value>) -> Self {
        Self {
            entities,
            extra: Map::new(),
        }
    }

    /// The first returned entity, if any.
    pub fn first_entity(&self) -> Option<&Value> {
        self.entities.first()
    }

    /// A top-level field outside `entities`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Client for the remote entity-graph service.
///
/// Implementations own transport, authentication and timeouts. Failures are
/// returned verbatim to the entity layer, which never retries.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn request(&self, request: StoreRequest) -> StoreResult<StoreResponse>;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for Arc<T> {
    async fn request(&self, request: StoreRequest) -> StoreResult<StoreResponse> {
        (**self).request(request).await
    }
}
