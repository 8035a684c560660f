#![allow(dead_code)]

use async_trait::async_trait;
use phrixus_model::{
    Entity, EntityClass, Model, RemoteStore, StoreError, StoreRequest, StoreResponse, StoreResult,
    validation,
};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays queued responses and records every request it receives.
#[derive(Default)]
pub struct RecordingStore {
    responses: Mutex<VecDeque<StoreResult<StoreResponse>>>,
    requests: Mutex<Vec<StoreRequest>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: StoreResponse) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(response));
        self
    }

    pub fn respond_entities(&self, entities: Vec<serde_json::Value>) -> &Self {
        self.respond(StoreResponse::with_entities(entities))
    }

    pub fn fail(&self, error: StoreError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<StoreRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn request(&self, request: StoreRequest) -> StoreResult<StoreResponse> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StoreResponse::default()))
    }
}

/// A minimal model used across the tests.
#[derive(Debug)]
pub struct Widget(pub Entity);

impl Model for Widget {
    const ENTITY_TYPE: &'static str = "widget";
    const COLLECTION: &'static str = "widgets";

    fn define(class: EntityClass) -> EntityClass {
        class.validates("label", vec![validation::required])
    }

    fn from_entity(entity: Entity) -> Self {
        Widget(entity)
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

/// A model with no rules.
#[derive(Debug)]
pub struct Gadget(pub Entity);

impl Model for Gadget {
    const ENTITY_TYPE: &'static str = "gadget";
    const COLLECTION: &'static str = "gadgets";

    fn from_entity(entity: Entity) -> Self {
        Gadget(entity)
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

pub fn widget_class() -> std::sync::Arc<EntityClass> {
    std::sync::Arc::new(Widget::define(EntityClass::new("widget", "widgets")))
}

pub fn attrs(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}
