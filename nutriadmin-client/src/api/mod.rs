//! Backend API bindings
//!
//! [`ApiClients`] is the composition root for HTTP access: it owns the JSON
//! and multipart clients, wires both to the same session, and hands out the
//! per-service APIs.

use crate::config::ApiClientConfig;
use crate::endpoints::ApiPaths;
use crate::http::HttpClient;
use crate::interceptor::{BearerAuth, ClearSessionOnUnauthorized};
use crate::ClientResult;
use nutriadmin_core::AdminConfig;
use nutriadmin_session::SessionService;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub mod auth;
pub mod inventory;
pub mod storage;

pub use auth::AuthApi;
pub use inventory::InventoryApi;
pub use storage::StorageApi;

/// JSON and multipart clients sharing one session
pub struct ApiClients<U = nutriadmin_session::UserRecord> {
    json: HttpClient,
    multipart: HttpClient,
    session: Arc<SessionService<U>>,
    paths: ApiPaths,
}

impl<U> ApiClients<U>
where
    U: Serialize + DeserializeOwned + 'static,
{
    /// Build both clients from the console configuration
    pub fn new(config: &AdminConfig, session: Arc<SessionService<U>>) -> ClientResult<Self> {
        Self::from_parts(
            ApiClientConfig::json(config),
            ApiClientConfig::multipart(config),
            ApiPaths::from_settings(&config.api),
            session,
        )
    }

    /// Build from explicit client configurations
    pub fn from_parts(
        json: ApiClientConfig,
        multipart: ApiClientConfig,
        paths: ApiPaths,
        session: Arc<SessionService<U>>,
    ) -> ClientResult<Self> {
        Ok(Self {
            json: authenticated(HttpClient::new(json)?, &session),
            multipart: authenticated(HttpClient::new(multipart)?, &session),
            session,
            paths,
        })
    }

    pub fn session(&self) -> &Arc<SessionService<U>> {
        &self.session
    }

    pub fn json_client(&self) -> &HttpClient {
        &self.json
    }

    pub fn multipart_client(&self) -> &HttpClient {
        &self.multipart
    }

    pub fn paths(&self) -> &ApiPaths {
        &self.paths
    }

    pub fn auth(&self) -> AuthApi<'_, U> {
        AuthApi::new(self)
    }

    pub fn storage(&self) -> StorageApi<'_, U> {
        StorageApi::new(self)
    }

    pub fn inventory(&self) -> InventoryApi<'_, U> {
        InventoryApi::new(self)
    }
}

/// Register the bearer-token and 401-teardown interceptors on a client
fn authenticated<U>(client: HttpClient, session: &Arc<SessionService<U>>) -> HttpClient
where
    U: Serialize + DeserializeOwned + 'static,
{
    client
        .with_request_interceptor(Arc::new(BearerAuth::new(session.clone())))
        .with_response_interceptor(Arc::new(ClearSessionOnUnauthorized::new(session.clone())))
}
