//! Request and response interceptors
//!
//! Interceptors run on every call made through an [`crate::HttpClient`], in
//! registration order.

use crate::{ClientError, ClientResult};
use nutriadmin_session::SessionService;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Runs before a request is sent
pub trait RequestInterceptor: Send + Sync {
    fn on_request(&self, request: &mut reqwest::Request) -> ClientResult<()>;
}

/// Runs after a call failed, before the error reaches the caller.
///
/// Successful responses pass through untouched. Interceptors observe the
/// error; they cannot replace it.
pub trait ResponseInterceptor: Send + Sync {
    fn on_error(&self, error: &ClientError);
}

/// Attaches `Authorization: Bearer <token>` when the session holds a token
pub struct BearerAuth<U> {
    session: Arc<SessionService<U>>,
}

impl<U> BearerAuth<U> {
    pub fn new(session: Arc<SessionService<U>>) -> Self {
        Self { session }
    }
}

impl<U> RequestInterceptor for BearerAuth<U>
where
    U: Serialize + DeserializeOwned,
{
    fn on_request(&self, request: &mut reqwest::Request) -> ClientResult<()> {
        let token = match self.session.get_token() {
            Ok(token) => token,
            Err(e) => {
                // the server decides what an unauthenticated call gets
                warn!(kind = e.kind(), error = %e, "Could not read session token");
                None
            }
        };

        match token.map(|t| HeaderValue::from_str(&format!("Bearer {}", t))) {
            Some(Ok(value)) => {
                request.headers_mut().insert(AUTHORIZATION, value);
                debug!(url = %request.url(), "Attached bearer token");
            }
            Some(Err(e)) => {
                // same as an unreadable token: send without the header
                warn!(url = %request.url(), error = %e, "Session token is not a valid header value");
            }
            None => debug!(url = %request.url(), "No session token, sending unauthenticated"),
        }

        Ok(())
    }
}

/// Clears the session whenever the backend answers `401 Unauthorized`.
///
/// It does not redirect or retry; the caller sees the original error.
pub struct ClearSessionOnUnauthorized<U> {
    session: Arc<SessionService<U>>,
}

impl<U> ClearSessionOnUnauthorized<U> {
    pub fn new(session: Arc<SessionService<U>>) -> Self {
        Self { session }
    }
}

impl<U> ResponseInterceptor for ClearSessionOnUnauthorized<U>
where
    U: Serialize + DeserializeOwned,
{
    fn on_error(&self, error: &ClientError) {
        if let ClientError::Unauthorized { url, .. } = error {
            warn!(%url, "Backend rejected credentials, clearing session");
            if let Err(e) = self.session.clear_session() {
                warn!(kind = e.kind(), error = %e, "Failed to clear session after 401");
            }
        }
    }
}
