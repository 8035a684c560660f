//! Remote store connection settings.

use serde::{Deserialize, Serialize};

/// Where the remote store lives and how to authenticate against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Service root, e.g. `https://api.usergrid.com`.
    pub base_url: String,
    /// Organization segment of every path.
    pub org: String,
    /// Application segment of every path.
    pub app: String,
    /// Client credentials; when both are set a token is fetched lazily.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    /// A pre-issued bearer token. Takes precedence over client credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.usergrid.com".to_string(),
            org: String::new(),
            app: String::new(),
            client_id: None,
            client_secret: None,
            access_token: None,
            timeout_secs: 30,
        }
    }
}

impl StoreConfig {
    /// Absolute URL for an endpoint below the application root.
    pub fn url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.org,
            self.app,
            endpoint.trim_start_matches('/')
        )
    }

    pub fn has_client_credentials(&self) -> bool {
        self.client_id.as_deref().is_some_and(|s| !s.is_empty())
            && self.client_secret.as_deref().is_some_and(|s| !s.is_empty())
    }
}
