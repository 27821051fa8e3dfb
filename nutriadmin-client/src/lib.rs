//! HTTP access to the nutriadmin backend
//!
//! Two [`HttpClient`] instances (JSON and multipart) share one session.
//! Request interceptors attach the bearer token; response interceptors tear
//! the session down on `401`. Nothing here retries: every call resolves or
//! fails exactly once.

pub mod api;
pub mod config;
pub mod endpoints;
pub mod http;
pub mod interceptor;
pub mod models;

pub use api::{ApiClients, AuthApi, InventoryApi, StorageApi};
pub use config::ApiClientConfig;
pub use endpoints::{ApiPaths, ApiService, Endpoint};
pub use http::{HttpClient, RequestBody};
pub use interceptor::{BearerAuth, ClearSessionOnUnauthorized, RequestInterceptor, ResponseInterceptor};
pub use models::*;

use nutriadmin_core::{not_found_error, ErrorContext, NutriError};
use nutriadmin_session::SessionError;
use thiserror::Error;

/// Errors surfaced by the HTTP layer
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Unauthorized (401) for {url}: {message}")]
    Unauthorized { url: String, message: String },

    #[error("HTTP {status} for {url}: {message}")]
    Http {
        status: u16,
        url: String,
        message: String,
    },

    #[error("Network error for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} timed out")]
    Timeout { url: String, elapsed_ms: u64 },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Core error: {0}")]
    Core(#[from] NutriError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Create an invalid request error
    pub fn invalid_request<S: Into<String>>(message: S) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Unauthorized { .. } => Some(401),
            ClientError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ClientError::Unauthorized { .. })
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Failures a caller might choose to retry (network, timeout, 5xx)
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Network { .. } | ClientError::Timeout { .. } => true,
            ClientError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<ClientError> for NutriError {
    fn from(error: ClientError) -> Self {
        let message = error.to_string();
        match error {
            ClientError::Unauthorized { url, .. } => NutriError::Authentication {
                message,
                context: ErrorContext::new("client")
                    .with_metadata("url", &url)
                    .with_suggestion("Run 'nutriadmin login' to sign in again"),
            },
            ClientError::Http { status: 404, url, .. } => not_found_error!(url, "client"),
            ClientError::Http { status, url, .. } if status >= 500 => NutriError::Network {
                message,
                source: None,
                context: ErrorContext::new("client")
                    .with_metadata("url", &url)
                    .with_metadata("status", &status.to_string()),
            },
            ClientError::Http { status, url, .. } => NutriError::Validation {
                message,
                field: None,
                context: ErrorContext::new("client")
                    .with_metadata("url", &url)
                    .with_metadata("status", &status.to_string()),
            },
            ClientError::Network { url, source } => NutriError::Network {
                message,
                source: Some(Box::new(source)),
                context: ErrorContext::new("client").with_metadata("url", &url),
            },
            ClientError::Timeout { url, elapsed_ms } => NutriError::Timeout {
                operation: url,
                duration_ms: elapsed_ms,
                context: ErrorContext::new("client")
                    .with_suggestion("Raise api.json_timeout_seconds or try again"),
            },
            ClientError::Decode { url, .. } => NutriError::Internal {
                message,
                source: None,
                context: ErrorContext::new("client").with_metadata("url", &url),
            },
            ClientError::InvalidRequest { .. } => NutriError::Validation {
                message,
                field: None,
                context: ErrorContext::new("client"),
            },
            ClientError::Session(e) => e.into(),
            ClientError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ClientError {
        ClientError::Http {
            status,
            url: "http://localhost:4000/inventory/productos/9".to_string(),
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_conversion_to_core_error() {
        let unauthorized = NutriError::from(ClientError::Unauthorized {
            url: "http://localhost:4000/auth/me".to_string(),
            message: "jwt expired".to_string(),
        });
        assert!(matches!(unauthorized, NutriError::Authentication { .. }));
        assert!(!unauthorized.is_recoverable());

        match NutriError::from(http(404)) {
            NutriError::NotFound { resource, .. } => assert!(resource.ends_with("/productos/9")),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let unavailable = NutriError::from(http(503));
        assert!(matches!(unavailable, NutriError::Network { .. }));
        assert!(unavailable.is_recoverable());

        let rejected = NutriError::from(http(400));
        assert!(matches!(rejected, NutriError::Validation { .. }));
        assert!(!rejected.is_recoverable());

        let timeout = NutriError::from(ClientError::Timeout {
            url: "http://localhost:4000/storage/upload".to_string(),
            elapsed_ms: 60_000,
        });
        match &timeout {
            NutriError::Timeout { duration_ms, .. } => assert_eq!(*duration_ms, 60_000),
            other => panic!("Expected Timeout, got {:?}", other),
        }
        assert!(timeout.is_recoverable());

        let session = NutriError::from(ClientError::Session(SessionError::corrupt("bad json")));
        assert!(matches!(session, NutriError::Storage { .. }));
    }
}
