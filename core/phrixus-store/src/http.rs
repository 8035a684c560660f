//! HTTP client for a Usergrid-style entity store.

use crate::config::StoreConfig;
use async_trait::async_trait;
use phrixus_model::{Method, RemoteStore, StoreError, StoreRequest, StoreResponse, StoreResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Error body the store sends with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// [`RemoteStore`] over HTTP.
///
/// Requests carry a bearer token when one is available: either the
/// configured `access_token` or one obtained with client credentials on
/// first use. Nothing is retried.
pub struct HttpRemoteStore {
    config: StoreConfig,
    client: Client,
    token: Arc<RwLock<Option<String>>>,
}

impl HttpRemoteStore {
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoreError::Network(format!("failed to create HTTP client: {e}")))?;
        let token = config.access_token.clone();

        Ok(Self {
            config,
            client,
            token: Arc::new(RwLock::new(token)),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replaces the bearer token used for subsequent requests.
    pub async fn set_access_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Drops the current token; the next request re-authenticates if client
    /// credentials are configured.
    pub async fn clear_access_token(&self) {
        *self.token.write().await = None;
    }

    pub async fn has_access_token(&self) -> bool {
        self.token.read().await.is_some()
    }

    async fn access_token(&self) -> StoreResult<Option<String>> {
        if let Some(token) = self.token.read().await.as_ref() {
            return Ok(Some(token.clone()));
        }
        if !self.config.has_client_credentials() {
            return Ok(None);
        }

        let token = self.fetch_client_token().await?;
        *self.token.write().await = Some(token.clone());
        Ok(Some(token))
    }

    async fn fetch_client_token(&self) -> StoreResult<String> {
        debug!("Requesting remote store client token");

        let body = serde_json::json!({
            "grant_type": "client_credentials",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
        });
        let response = self
            .client
            .post(self.config.url("token"))
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("token request failed: {e}")))?;

        if !response.status().is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(StoreError::Auth(format!("token request failed: {error}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Auth(format!("failed to parse token response: {e}")))?;

        info!("Remote store client token acquired");
        Ok(token.access_token)
    }
}

fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn request(&self, request: StoreRequest) -> StoreResult<StoreResponse> {
        let url = self.config.url(&request.endpoint);
        let mut builder = self.client.request(http_method(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = self.access_token().await? {
            builder = builder.bearer_auth(token);
        }

        debug!(%request, "Sending store request");
        let response = builder
            .send()
            .await
            .map_err(|e| StoreError::Network(format!("{request} failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StoreError::Network(format!("failed to read {request} response: {e}")))?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(StoreResponse::default());
            }
            return Ok(serde_json::from_str(&text)?);
        }

        warn!(%request, status = status.as_u16(), "Store request failed");
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        match status {
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(request.endpoint)),
            StatusCode::UNAUTHORIZED => Err(StoreError::Auth(
                body.error_description
                    .or(body.error)
                    .unwrap_or_else(|| status.to_string()),
            )),
            _ => Err(StoreError::Api {
                status: status.as_u16(),
                error: body.error.unwrap_or_else(|| "unknown_error".to_string()),
                description: body.error_description.unwrap_or(text),
            }),
        }
    }
}
