//! Authentication and account administration

use super::ApiClients;
use crate::endpoints::{
    AUTH_ADMINS, AUTH_LOGIN, AUTH_PROFILE, AUTH_REGISTER_ADMIN, AUTH_REGISTER_CLIENT,
};
use crate::models::{AdminFilter, Administrator, LoginRequest, LoginResponse};
use crate::ClientResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

pub struct AuthApi<'a, U> {
    clients: &'a ApiClients<U>,
}

impl<'a, U> AuthApi<'a, U>
where
    U: Serialize + DeserializeOwned + 'static,
{
    pub(crate) fn new(clients: &'a ApiClients<U>) -> Self {
        Self { clients }
    }

    /// Log in and start a session holding both token and user
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<U>
    where
        U: Clone,
    {
        let path = self.clients.paths().resolve(&AUTH_LOGIN, &[])?;
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse<U> = self.clients.json_client().post(&path, &request).await?;
        self.clients
            .session()
            .start_session(&response.token, response.user.clone())?;

        info!(email, "Logged in");
        Ok(response.user)
    }

    /// Drop the local session. The backend keeps no server-side state to revoke.
    pub fn logout(&self) -> ClientResult<()> {
        self.clients.session().clear_session()?;
        Ok(())
    }

    /// Profile of the logged-in account
    pub async fn me(&self) -> ClientResult<U> {
        let path = self.clients.paths().resolve(&AUTH_PROFILE, &[])?;
        self.clients.json_client().get(&path).await
    }

    /// Register an administrator; `payload` is the validated form output
    pub async fn register_admin<P: Serialize + ?Sized>(&self, payload: &P) -> ClientResult<Value> {
        let path = self.clients.paths().resolve(&AUTH_REGISTER_ADMIN, &[])?;
        let created: Value = self.clients.json_client().post(&path, payload).await?;
        info!("Administrator registered");
        Ok(created)
    }

    /// Register a client account
    pub async fn register_client<P: Serialize + ?Sized>(
        &self,
        payload: &P,
    ) -> ClientResult<Value> {
        let path = self.clients.paths().resolve(&AUTH_REGISTER_CLIENT, &[])?;
        let created: Value = self.clients.json_client().post(&path, payload).await?;
        info!("Client registered");
        Ok(created)
    }

    pub async fn list_admins(&self) -> ClientResult<Vec<Administrator>> {
        let path = self.clients.paths().resolve(&AUTH_ADMINS, &[])?;
        self.clients.json_client().get(&path).await
    }

    /// List administrators and filter them locally
    pub async fn find_admins(&self, filter: &AdminFilter) -> ClientResult<Vec<Administrator>> {
        Ok(filter.apply(self.list_admins().await?))
    }
}
