//! In-process store answering the entity-graph REST subset the mapping
//! layer uses. Intended for tests and local development only.
//!
//! Supported requests:
//! - `POST token` (password and client_credentials grants)
//! - `GET|POST {collection}` with `ql` (`select * where a=b and c='d'`) and `limit`
//! - `GET|PUT|DELETE {collection}/{id}` where `id` is a uuid, name or username
//! - `GET {collection}/{id}/{relation}`
//! - `POST|DELETE {collection}/{id}/{relation}/{target_collection}/{target_id}`

use async_trait::async_trait;
use phrixus_model::{Method, RemoteStore, StoreError, StoreRequest, StoreResponse, StoreResult};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

const TOKEN_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq)]
struct Edge {
    source: (String, String),
    relation: String,
    target: (String, String),
}

#[derive(Debug, Default)]
struct State {
    collections: HashMap<String, Vec<Map<String, Value>>>,
    edges: Vec<Edge>,
    requests: usize,
}

/// [`RemoteStore`] backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests handled so far.
    pub async fn request_count(&self) -> usize {
        self.state.lock().await.requests
    }

    /// Number of records currently in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.state
            .lock()
            .await
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn request(&self, request: StoreRequest) -> StoreResult<StoreResponse> {
        debug!(%request, "Memory store request");
        let mut state = self.state.lock().await;
        state.requests += 1;
        state.handle(request)
    }
}

fn bad_request(error: &str, description: impl Into<String>) -> StoreError {
    StoreError::Api {
        status: 400,
        error: error.to_string(),
        description: description.into(),
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn singular(collection: &str) -> &str {
    collection.strip_suffix('s').unwrap_or(collection)
}

fn matches_id(record: &Map<String, Value>, id: &str) -> bool {
    ["uuid", "name", "username"]
        .iter()
        .any(|key| record.get(*key).and_then(Value::as_str) == Some(id))
}

fn field_equals(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        other => other.to_string() == expected,
    }
}

/// Extracts `key=value` conditions from a `select * where ...` statement.
fn parse_ql(ql: &str) -> Vec<(String, String)> {
    let Some(start) = ql.to_ascii_lowercase().find("where") else {
        return Vec::new();
    };
    ql[start + "where".len()..]
        .replace(" AND ", " and ")
        .split(" and ")
        .filter_map(|condition| condition.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('\'').trim_matches('"');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn body_object(body: Option<Value>) -> StoreResult<Map<String, Value>> {
    match body {
        Some(Value::Object(fields)) => Ok(fields),
        None | Some(Value::Null) => Ok(Map::new()),
        Some(other) => Err(bad_request(
            "json_parse",
            format!("expected an object body, got {other}"),
        )),
    }
}

fn one(record: Map<String, Value>) -> StoreResponse {
    StoreResponse::with_entities(vec![Value::Object(record)])
}

impl State {
    fn handle(&mut self, request: StoreRequest) -> StoreResult<StoreResponse> {
        let segments = request
            .endpoint
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| urlencoding::decode(s).map(|d| d.into_owned()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| bad_request("bad_path", e.to_string()))?;

        match (request.method, segments.as_slice()) {
            (Method::Post, [token]) if token == "token" => self.grant(request.body),
            (Method::Get, [collection]) => Ok(self.list(collection, &request.query)),
            (Method::Post, [collection]) => self.create(collection, request.body),
            (Method::Get, [collection, id]) => self.get(collection, id).map(one),
            (Method::Put, [collection, id]) => self.update(collection, id, request.body),
            (Method::Delete, [collection, id]) => self.remove(collection, id),
            (Method::Get, [collection, id, relation]) => {
                self.connections(collection, id, relation)
            }
            (Method::Post, [collection, id, relation, target_collection, target_id]) => {
                self.connect(collection, id, relation, target_collection, target_id)
            }
            (Method::Delete, [collection, id, relation, target_collection, target_id]) => {
                self.disconnect(collection, id, relation, target_collection, target_id)
            }
            _ => Err(bad_request(
                "unsupported_request",
                format!("{request} is not supported"),
            )),
        }
    }

    fn find(&self, collection: &str, id: &str) -> Option<&Map<String, Value>> {
        self.collections
            .get(collection)?
            .iter()
            .find(|record| matches_id(record, id))
    }

    fn get(&self, collection: &str, id: &str) -> StoreResult<Map<String, Value>> {
        self.find(collection, id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))
    }

    fn uuid_of(&self, collection: &str, id: &str) -> StoreResult<String> {
        self.get(collection, id)?
            .get("uuid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))
    }

    fn list(&self, collection: &str, query: &[(String, String)]) -> StoreResponse {
        let conditions = query
            .iter()
            .find(|(key, _)| key == "ql")
            .map(|(_, ql)| parse_ql(ql))
            .unwrap_or_default();
        let limit = query
            .iter()
            .find(|(key, _)| key == "limit")
            .and_then(|(_, limit)| limit.parse::<usize>().ok())
            .unwrap_or(usize::MAX);

        let entities = self
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|record| {
                conditions.iter().all(|(key, expected)| {
                    record
                        .get(key)
                        .is_some_and(|value| field_equals(value, expected))
                })
            })
            .take(limit)
            .cloned()
            .map(Value::Object)
            .collect();
        StoreResponse::with_entities(entities)
    }

    fn create(&mut self, collection: &str, body: Option<Value>) -> StoreResult<StoreResponse> {
        let mut record = body_object(body)?;
        for key in ["name", "username"] {
            if let Some(value) = record.get(key).and_then(Value::as_str) {
                if self.find(collection, value).is_some() {
                    return Err(bad_request(
                        "duplicate_unique_property_exists",
                        format!("{collection} with {key} {value} already exists"),
                    ));
                }
            }
        }

        let uuid = Uuid::new_v4().to_string();
        let now = now_millis();
        record.remove("metadata");
        record.insert("uuid".into(), json!(uuid));
        record
            .entry("type")
            .or_insert_with(|| json!(singular(collection)));
        record.insert("created".into(), json!(now));
        record.insert("modified".into(), json!(now));
        record.insert(
            "metadata".into(),
            json!({ "path": format!("/{collection}/{uuid}") }),
        );

        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(record.clone());
        Ok(one(record))
    }

    fn update(
        &mut self,
        collection: &str,
        id: &str,
        body: Option<Value>,
    ) -> StoreResult<StoreResponse> {
        let changes = body_object(body)?;
        let record = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.iter_mut().find(|record| matches_id(record, id)))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;

        for (key, value) in changes {
            if matches!(key.as_str(), "uuid" | "type" | "created" | "metadata") {
                continue;
            }
            record.insert(key, value);
        }
        record.insert("modified".into(), json!(now_millis()));
        Ok(one(record.clone()))
    }

    fn remove(&mut self, collection: &str, id: &str) -> StoreResult<StoreResponse> {
        let records = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        let index = records
            .iter()
            .position(|record| matches_id(record, id))
            .ok_or_else(|| StoreError::NotFound(format!("{collection}/{id}")))?;
        let record = records.remove(index);

        if let Some(uuid) = record.get("uuid").and_then(Value::as_str) {
            let node = (collection.to_string(), uuid.to_string());
            self.edges
                .retain(|edge| edge.source != node && edge.target != node);
        }
        Ok(one(record))
    }

    fn connections(
        &self,
        collection: &str,
        id: &str,
        relation: &str,
    ) -> StoreResult<StoreResponse> {
        let source = (collection.to_string(), self.uuid_of(collection, id)?);
        let entities = self
            .edges
            .iter()
            .filter(|edge| edge.source == source && edge.relation == relation)
            .filter_map(|edge| self.find(&edge.target.0, &edge.target.1))
            .cloned()
            .map(Value::Object)
            .collect();
        Ok(StoreResponse::with_entities(entities))
    }

    fn edge(
        &self,
        collection: &str,
        id: &str,
        relation: &str,
        target_collection: &str,
        target_id: &str,
    ) -> StoreResult<Edge> {
        Ok(Edge {
            source: (collection.to_string(), self.uuid_of(collection, id)?),
            relation: relation.to_string(),
            target: (
                target_collection.to_string(),
                self.uuid_of(target_collection, target_id)?,
            ),
        })
    }

    fn connect(
        &mut self,
        collection: &str,
        id: &str,
        relation: &str,
        target_collection: &str,
        target_id: &str,
    ) -> StoreResult<StoreResponse> {
        let edge = self.edge(collection, id, relation, target_collection, target_id)?;
        if !self.edges.contains(&edge) {
            self.edges.push(edge);
        }
        self.get(target_collection, target_id).map(one)
    }

    fn disconnect(
        &mut self,
        collection: &str,
        id: &str,
        relation: &str,
        target_collection: &str,
        target_id: &str,
    ) -> StoreResult<StoreResponse> {
        let edge = self.edge(collection, id, relation, target_collection, target_id)?;
        self.edges.retain(|existing| *existing != edge);
        self.get(target_collection, target_id).map(one)
    }

    fn grant(&self, body: Option<Value>) -> StoreResult<StoreResponse> {
        let body = body_object(body)?;
        let grant_type = body.get("grant_type").and_then(Value::as_str);

        let mut response = StoreResponse::default();
        match grant_type {
            Some("password") => {
                let username = body
                    .get("username")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let user = self
                    .find("users", username)
                    .cloned()
                    .ok_or_else(|| bad_request("invalid_grant", "invalid username or password"))?;
                let uuid = user.get("uuid").and_then(Value::as_str).unwrap_or_default();
                response
                    .extra
                    .insert("access_token".into(), json!(format!("memory-{uuid}")));
                response.extra.insert("user".into(), Value::Object(user));
            }
            Some("client_credentials") => {
                response
                    .extra
                    .insert("access_token".into(), json!("memory-client"));
            }
            other => {
                return Err(bad_request(
                    "unsupported_grant_type",
                    format!("grant type {other:?} is not supported"),
                ));
            }
        }
        response
            .extra
            .insert("expires_in".into(), json!(TOKEN_TTL_SECS));
        Ok(response)
    }
}
