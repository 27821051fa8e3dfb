//! Per-client HTTP configuration

use nutriadmin_core::AdminConfig;
use std::collections::HashMap;

/// Configuration for one HTTP client instance
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Backend address, e.g. `http://localhost:4000`
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Default headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            base_url: nutriadmin_core::DEFAULT_API_URL.to_string(),
            timeout_seconds: 10,
            user_agent: format!("nutriadmin/{}", env!("CARGO_PKG_VERSION")),
            headers: HashMap::new(),
        }
    }
}

impl ApiClientConfig {
    /// JSON client: accepts JSON, short timeout
    pub fn json(config: &AdminConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout_seconds: config.api.json_timeout_seconds,
            user_agent: config.api.user_agent.clone(),
            headers: HashMap::new(),
        }
        .with_header("Accept", "application/json")
    }

    /// Multipart client: longer timeout for uploads.
    ///
    /// The multipart body sets `Content-Type: multipart/form-data` together
    /// with its boundary, so no static content type is configured here.
    pub fn multipart(config: &AdminConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            timeout_seconds: config.api.multipart_timeout_seconds,
            user_agent: config.api.user_agent.clone(),
            headers: HashMap::new(),
        }
        .with_header("Accept", "application/json")
    }

    /// Set additional header
    pub fn with_header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    /// Set base URL
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }
}
