use phrixus_cart::{CartService, User, registry};
use phrixus_model::collection;
use phrixus_server::{OWNER_HEADER, build_router, seed_users};
use phrixus_store::MemoryStore;
use pretty_assertions::assert_eq;
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn attrs(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected a JSON object"),
    }
}

struct TestServer {
    base: String,
    client: reqwest::Client,
    not_my_cart: String,
}

impl TestServer {
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn as_owner(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header(OWNER_HEADER, "testuser")
    }
}

/// Spin up the HTTP server on an OS-assigned port over an in-process store
/// seeded with `testuser` and one cart nobody owns.
async fn spawn_test_server() -> TestServer {
    let registry = Arc::new(registry().unwrap());
    let store = Arc::new(MemoryStore::new());
    let _: User = collection::create(&registry, &*store, attrs(json!({"username": "testuser"})))
        .await
        .unwrap();
    let service = CartService::new(registry, store);
    let not_my_cart = service.create(attrs(json!({"foo": "bar"}))).await.unwrap();
    let not_my_cart = not_my_cart.uuid().unwrap().to_string();

    let app = build_router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        not_my_cart,
    }
}

async fn create_my_cart(server: &TestServer, body: Value) -> Value {
    let resp = server
        .as_owner(server.client.post(server.url("/my/carts")))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

// ── Owner-scoped routes ──────────────────────────────────────────

#[tokio::test]
async fn create_my_cart_returns_saved_entity() {
    let server = spawn_test_server().await;

    let cart = create_my_cart(&server, json!({"foo": "bobo"})).await;

    assert_eq!(cart["foo"], "bobo");
    assert_eq!(cart["type"], "cart");
    assert!(cart["uuid"].is_string());
    assert!(cart.get("metadata").is_none());
}

#[tokio::test]
async fn list_my_carts_excludes_other_carts() {
    let server = spawn_test_server().await;
    let mine = create_my_cart(&server, json!({"foo": "bobo"})).await;

    let resp = server
        .as_owner(server.client.get(server.url("/my/carts")))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let carts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["uuid"], mine["uuid"]);
}

#[tokio::test]
async fn get_my_cart_by_id() {
    let server = spawn_test_server().await;
    let mine = create_my_cart(&server, json!({"foo": "bobo"})).await;
    let id = mine["uuid"].as_str().unwrap();

    let resp = server
        .as_owner(server.client.get(server.url(&format!("/my/carts/{id}"))))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["foo"], "bobo");
}

#[tokio::test]
async fn get_someone_elses_cart_is_404() {
    let server = spawn_test_server().await;

    let resp = server
        .as_owner(
            server
                .client
                .get(server.url(&format!("/my/carts/{}", server.not_my_cart))),
        )
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn update_my_cart_changes_attribute() {
    let server = spawn_test_server().await;
    let mine = create_my_cart(&server, json!({"foo": "bobo"})).await;
    let id = mine["uuid"].as_str().unwrap();

    let resp = server
        .as_owner(server.client.put(server.url(&format!("/my/carts/{id}"))))
        .json(&json!({"foo": "baz"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["foo"], "baz");
    assert_eq!(cart["uuid"], mine["uuid"]);
}

#[tokio::test]
async fn delete_my_cart_then_get_is_404() {
    let server = spawn_test_server().await;
    let mine = create_my_cart(&server, json!({"foo": "bobo"})).await;
    let path = format!("/my/carts/{}", mine["uuid"].as_str().unwrap());

    let resp = server
        .as_owner(server.client.delete(server.url(&path)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .as_owner(server.client.get(server.url(&path)))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn my_carts_without_owner_header_is_401() {
    let server = spawn_test_server().await;

    let resp = server.client.get(server.url("/my/carts")).send().await.unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn my_carts_for_unknown_owner_is_404() {
    let server = spawn_test_server().await;

    let resp = server
        .client
        .get(server.url("/my/carts"))
        .header(OWNER_HEADER, "nobody")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn seeded_user_can_use_my_carts_on_empty_store() {
    let registry = Arc::new(registry().unwrap());
    let service = CartService::new(registry, Arc::new(MemoryStore::new()));
    seed_users(&service, &["alice".to_string()]).await.unwrap();

    let app = build_router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/my/carts", base))
        .header(OWNER_HEADER, "alice")
        .json(&json!({"foo": "bobo"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{}/my/carts", base))
        .header(OWNER_HEADER, "alice")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let carts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["foo"], "bobo");
}

#[tokio::test]
async fn update_my_cart_cannot_retarget_another_cart() {
    let server = spawn_test_server().await;
    let mine = create_my_cart(&server, json!({"foo": "bobo"})).await;
    let id = mine["uuid"].as_str().unwrap();

    let resp = server
        .as_owner(server.client.put(server.url(&format!("/my/carts/{id}"))))
        .json(&json!({"uuid": server.not_my_cart, "foo": "changed"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["uuid"], mine["uuid"]);

    let resp = server
        .client
        .get(server.url(&format!("/carts/{}", server.not_my_cart)))
        .send()
        .await
        .unwrap();
    let other: Value = resp.json().await.unwrap();
    assert_eq!(other["foo"], "bar");
}

// ── Generic routes ───────────────────────────────────────────────

#[tokio::test]
async fn list_carts_includes_every_cart() {
    let server = spawn_test_server().await;
    create_my_cart(&server, json!({"foo": "bobo"})).await;

    let resp = server.client.get(server.url("/carts")).send().await.unwrap();

    assert_eq!(resp.status(), 200);
    let carts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(carts.len(), 2);
}

#[tokio::test]
async fn list_carts_filtered_by_uuid_returns_one() {
    let server = spawn_test_server().await;
    create_my_cart(&server, json!({"foo": "bobo"})).await;

    let resp = server
        .client
        .get(server.url("/carts"))
        .query(&[("q", format!("uuid={}", server.not_my_cart))])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let carts: Vec<Value> = resp.json().await.unwrap();
    assert_eq!(carts.len(), 1);
    assert_eq!(carts[0]["uuid"], server.not_my_cart.as_str());
}

#[tokio::test]
async fn create_and_get_cart() {
    let server = spawn_test_server().await;

    let resp = server
        .client
        .post(server.url("/carts"))
        .json(&json!({"name": "weekly", "foo": "bar"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server
        .client
        .get(server.url("/carts/weekly"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["name"], "weekly");
    assert_eq!(cart["foo"], "bar");
}

#[tokio::test]
async fn update_cart_changes_attribute() {
    let server = spawn_test_server().await;
    let path = format!("/carts/{}", server.not_my_cart);

    let resp = server
        .client
        .put(server.url(&path))
        .json(&json!({"foo": "qux"}))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["foo"], "qux");
}

#[tokio::test]
async fn delete_cart_closes_it() {
    let server = spawn_test_server().await;
    let path = format!("/carts/{}", server.not_my_cart);

    let resp = server.client.delete(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), 200);

    let resp = server.client.get(server.url(&path)).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.unwrap();
    assert_eq!(cart["status"], "closed");
}

#[tokio::test]
async fn get_missing_cart_is_404() {
    let server = spawn_test_server().await;

    let resp = server
        .client
        .get(server.url("/carts/does-not-exist"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let server = spawn_test_server().await;

    let resp = server.client.get(server.url("/nonexistent")).send().await.unwrap();

    assert_eq!(resp.status(), 404);
}
