//! HTTP API for the Phrixus cart service.
//!
//! `/carts` works on the whole collection; `/my/carts` works on the carts
//! connected to the user named in the `x-phrixus-user` header.

use std::sync::Arc;
use axum::{
    Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use phrixus_cart::{Cart, CartService, ServiceError};
use phrixus_model::ModelError;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::warn;

/// Header carrying the username owner-scoped routes act for.
pub const OWNER_HEADER: &str = "x-phrixus-user";

type Attributes = Map<String, Value>;
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Where-clause filter, e.g. `uuid=<id>`.
    pub q: Option<String>,
}

/// The caller on owner-scoped routes.
#[derive(Debug, Clone)]
pub struct Owner(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| Owner(name.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

/// Maps service failures onto HTTP statuses.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "unauthorized",
                    "error_description": format!("missing {OWNER_HEADER} header"),
                }),
            ),
            ApiError::Service(ServiceError::NotFound(what)) => (
                StatusCode::NOT_FOUND,
                json!({"error": "not_found", "error_description": what}),
            ),
            ApiError::Service(ServiceError::Model(ModelError::Validation(errors))) => (
                StatusCode::BAD_REQUEST,
                json!({"error": "validation_failed", "errors": errors}),
            ),
            ApiError::Service(ServiceError::Model(ModelError::Store(err))) => {
                warn!(error = %err, "remote store failure");
                (
                    StatusCode::BAD_GATEWAY,
                    json!({"error": "remote_store", "error_description": err.to_string()}),
                )
            }
            ApiError::Service(ServiceError::Model(err)) => {
                warn!(error = %err, "cart service failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "internal", "error_description": err.to_string()}),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

// ── Generic carts ────────────────────────────────────────────────

async fn list_carts(
    State(service): State<Arc<CartService>>,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Cart>> {
    Ok(Json(service.list(params.q.as_deref()).await?))
}

async fn create_cart(
    State(service): State<Arc<CartService>>,
    Json(attributes): Json<Attributes>,
) -> ApiResult<Cart> {
    Ok(Json(service.create(attributes).await?))
}

async fn get_cart(
    State(service): State<Arc<CartService>>,
    Path(id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(service.get(&id).await?))
}

async fn update_cart(
    State(service): State<Arc<CartService>>,
    Path(id): Path<String>,
    Json(attributes): Json<Attributes>,
) -> ApiResult<Cart> {
    Ok(Json(service.update(&id, attributes).await?))
}

async fn close_cart(
    State(service): State<Arc<CartService>>,
    Path(id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(service.close(&id).await?))
}

// ── Owner-scoped carts ───────────────────────────────────────────

async fn list_my_carts(
    State(service): State<Arc<CartService>>,
    Owner(owner): Owner,
) -> ApiResult<Vec<Cart>> {
    Ok(Json(service.list_owned(&owner).await?))
}

async fn create_my_cart(
    State(service): State<Arc<CartService>>,
    Owner(owner): Owner,
    Json(attributes): Json<Attributes>,
) -> ApiResult<Cart> {
    Ok(Json(service.create_owned(&owner, attributes).await?))
}

async fn get_my_cart(
    State(service): State<Arc<CartService>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(service.get_owned(&owner, &id).await?))
}

async fn update_my_cart(
    State(service): State<Arc<CartService>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(attributes): Json<Attributes>,
) -> ApiResult<Cart> {
    Ok(Json(service.update_owned(&owner, &id, attributes).await?))
}

async fn remove_my_cart(
    State(service): State<Arc<CartService>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> ApiResult<Cart> {
    Ok(Json(service.remove_owned(&owner, &id).await?))
}

/// Makes sure every named user exists, so owner-scoped routes can act for
/// them against a fresh store.
pub async fn seed_users(
    service: &CartService,
    usernames: &[String],
) -> Result<(), ServiceError> {
    for username in usernames {
        service.ensure_user(username).await?;
    }
    Ok(())
}

/// Build the HTTP API router over the given cart service.
pub fn build_router(service: Arc<CartService>) -> Router {
    Router::new()
        .route("/carts", get(list_carts).post(create_cart))
        .route(
            "/carts/{id}",
            get(get_cart).put(update_cart).delete(close_cart),
        )
        .route("/my/carts", get(list_my_carts).post(create_my_cart))
        .route(
            "/my/carts/{id}",
            get(get_my_cart).put(update_my_cart).delete(remove_my_cart),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use phrixus_model::{FieldError, StoreError, ValidationErrors};

    #[test]
    fn validation_failure_maps_to_400() {
        let mut errors = ValidationErrors::new();
        errors.add("product", FieldError::new("required", "is required"));
        let err = ApiError::from(ServiceError::Model(ModelError::Validation(errors)));

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_failure_maps_to_502() {
        let err = ApiError::from(ServiceError::Model(ModelError::Store(StoreError::Network(
            "connection refused".into(),
        ))));

        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::from(ServiceError::NotFound("cart 42".into()));

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn missing_owner_maps_to_401() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
