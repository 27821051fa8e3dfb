//! HTTP client with interceptor chains

use crate::config::ApiClientConfig;
use crate::interceptor::{RequestInterceptor, ResponseInterceptor};
use crate::{ClientError, ClientResult};
use nutriadmin_core::ErrorContext;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Request payload
pub enum RequestBody {
    Empty,
    Json(Value),
    Multipart(reqwest::multipart::Form),
}

/// One configured HTTP client plus its interceptors
pub struct HttpClient {
    client: reqwest::Client,
    config: ApiClientConfig,
    request_interceptors: Vec<Arc<dyn RequestInterceptor>>,
    response_interceptors: Vec<Arc<dyn ResponseInterceptor>>,
}

impl HttpClient {
    /// Create a new client from configuration
    pub fn new(config: ApiClientConfig) -> ClientResult<Self> {
        let client = create_http_client(&config)?;

        info!(
            base_url = %config.base_url,
            timeout_seconds = config.timeout_seconds,
            "Created HTTP client"
        );

        Ok(Self {
            client,
            config,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        })
    }

    pub fn with_request_interceptor(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_interceptors.push(interceptor);
        self
    }

    pub fn with_response_interceptor(
        mut self,
        interceptor: Arc<dyn ResponseInterceptor>,
    ) -> Self {
        self.response_interceptors.push(interceptor);
        self
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Absolute URL for a path under the base URL
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Send one request through both interceptor chains.
    ///
    /// Non-2xx answers come back as errors after the response chain has seen
    /// them. There is no retry.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> ClientResult<reqwest::Response> {
        let url = self.url_for(path);
        let builder = self.client.request(method.clone(), &url);
        let builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let mut request = builder.build().map_err(|e| {
            ClientError::invalid_request(format!("could not build request for {}: {}", url, e))
        })?;

        for interceptor in &self.request_interceptors {
            interceptor.on_request(&mut request)?;
        }

        let start = Instant::now();
        let result = match self.client.execute(request).await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(error_from_response(response).await),
            Err(e) if e.is_timeout() => Err(ClientError::Timeout {
                url: url.clone(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            }),
            Err(e) => Err(ClientError::Network {
                url: url.clone(),
                source: e,
            }),
        };

        match &result {
            Ok(response) => debug!(
                %method,
                %url,
                status = response.status().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request completed"
            ),
            Err(error) => {
                debug!(
                    %method,
                    %url,
                    status = ?error.status(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %error,
                    "Request failed"
                );
                for interceptor in &self.response_interceptors {
                    interceptor.on_error(error);
                }
            }
        }

        result
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.send(Method::GET, path, RequestBody::Empty).await?;
        decode_response(response).await
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .send(Method::POST, path, RequestBody::Json(to_json(body)?))
            .await?;
        decode_response(response).await
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let response = self
            .send(Method::PUT, path, RequestBody::Json(to_json(body)?))
            .await?;
        decode_response(response).await
    }

    /// DELETE; the response body is ignored
    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        self.send(Method::DELETE, path, RequestBody::Empty).await?;
        Ok(())
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> ClientResult<T> {
        let response = self
            .send(Method::POST, path, RequestBody::Multipart(form))
            .await?;
        decode_response(response).await
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> ClientResult<Value> {
    serde_json::to_value(body)
        .map_err(|e| ClientError::invalid_request(format!("body is not serializable: {}", e)))
}

/// Helper function to create HTTP client with common configuration
fn create_http_client(config: &ApiClientConfig) -> ClientResult<reqwest::Client> {
    let mut headers = HeaderMap::new();

    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&config.user_agent).map_err(|e| {
            ClientError::invalid_request(format!("Invalid user agent: {}", e))
        })?,
    );

    for (key, value) in &config.headers {
        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| {
            ClientError::invalid_request(format!("Invalid header name '{}': {}", key, e))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            ClientError::invalid_request(format!("Invalid header value for '{}': {}", key, e))
        })?;
        headers.insert(header_name, header_value);
    }

    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(config.timeout_seconds))
        .default_headers(headers)
        .build()
        .map_err(|e| {
            ClientError::Core(nutriadmin_core::NutriError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
                context: ErrorContext::new("http_client").with_operation("create_client"),
            })
        })
}

/// Turn a non-2xx response into an error, keeping the server's message
async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();

    let message = extract_error_message(&body).unwrap_or_else(|| {
        if body.trim().is_empty() {
            status.canonical_reason().unwrap_or("Unknown error").to_string()
        } else {
            body.trim().to_string()
        }
    });

    if status == reqwest::StatusCode::UNAUTHORIZED {
        ClientError::Unauthorized { url, message }
    } else {
        ClientError::Http {
            status: status.as_u16(),
            url,
            message,
        }
    }
}

/// `{"message": ..}` / `{"error": ..}`; message lists are joined
pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = value.get("message").or_else(|| value.get("error"))?;
    match field {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let url = response.url().to_string();
    let bytes = response.bytes().await.map_err(|e| ClientError::Decode {
        url: url.clone(),
        message: e.to_string(),
    })?;

    let value: Value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?
    };

    decode_payload(value).map_err(|message| ClientError::Decode { url, message })
}

/// Decode `T` from a payload that may or may not be wrapped in `{"data": ..}`
pub(crate) fn decode_payload<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    let direct_error = match serde_json::from_value::<T>(value.clone()) {
        Ok(decoded) => return Ok(decoded),
        Err(e) => e.to_string(),
    };

    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            let inner = map.remove("data").unwrap_or(Value::Null);
            serde_json::from_value(inner).map_err(|e| e.to_string())
        }
        _ => Err(direct_error),
    }
}
