//! Session Service - typed session state over a credential store
//!
//! The token and the user are kept together in one versioned record under a
//! single key, so a write or a clear never leaves half a session behind.

use crate::store::{CookieOptions, CredentialStore};
use crate::{SessionError, SessionResult};
use nutriadmin_core::{de, AdminConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Version written into every stored session record
pub const SESSION_RECORD_VERSION: u32 = 1;

/// Open-ended user record as returned by the backend.
///
/// Only the identifier is required; everything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(alias = "_id", deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserRecord {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    pub fn with_field<K: Into<String>>(mut self, key: K, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up an arbitrary attribute
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn email(&self) -> Option<&str> {
        self.get("email").and_then(Value::as_str)
    }

    /// "nombre apellidoPaterno" when available, else the email, else the id
    pub fn display_name(&self) -> String {
        let name = self.get("nombre").and_then(Value::as_str);
        let surname = self.get("apellidoPaterno").and_then(Value::as_str);
        match (name, surname) {
            (Some(n), Some(s)) => format!("{} {}", n, s),
            (Some(n), None) => n.to_string(),
            _ => self
                .email()
                .map(str::to_string)
                .unwrap_or_else(|| self.id.clone()),
        }
    }
}

/// Session namespace and cookie options
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prefix that separates independent sessions sharing a store
    pub namespace: String,
    pub options: CookieOptions,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            namespace: "nutriadmin".to_string(),
            options: CookieOptions::default(),
        }
    }
}

impl SessionConfig {
    pub fn new<S: Into<String>>(namespace: S, options: CookieOptions) -> Self {
        Self {
            namespace: namespace.into(),
            options,
        }
    }

    /// Derive namespace and options from the console configuration
    pub fn from_admin_config(config: &AdminConfig) -> Self {
        Self {
            namespace: config.session.namespace.clone(),
            options: CookieOptions::from_settings(&config.session, config.secure_cookies()),
        }
    }

    /// Store key holding the session record
    pub fn record_key(&self) -> String {
        format!("{}_session", self.namespace)
    }
}

/// The persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession<U> {
    #[serde(rename = "v")]
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<U>,
}

impl<U> StoredSession<U> {
    fn empty() -> Self {
        Self {
            version: SESSION_RECORD_VERSION,
            token: None,
            user: None,
        }
    }

    fn is_empty(&self) -> bool {
        self.token.is_none() && self.user.is_none()
    }
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq)]
pub struct Session<U> {
    pub token: Option<String>,
    pub user: Option<U>,
}

impl<U> Session<U> {
    /// True iff both a token and a user are present. No expiry or signature check.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }
}

/// Typed session over a [`CredentialStore`].
///
/// Shared as `Arc<SessionService<U>>` between the HTTP clients and whatever
/// drives them; there is no process-wide instance.
pub struct SessionService<U = UserRecord> {
    store: Arc<dyn CredentialStore>,
    config: SessionConfig,
    _user: PhantomData<fn() -> U>,
}

impl<U> fmt::Debug for SessionService<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("namespace", &self.config.namespace)
            .field("options", &self.config.options)
            .finish()
    }
}

impl<U> SessionService<U>
where
    U: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn CredentialStore>, config: SessionConfig) -> Self {
        debug!(
            namespace = %config.namespace,
            "Session service created"
        );
        Self {
            store,
            config,
            _user: PhantomData,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Strict read of the stored record.
    ///
    /// Distinguishes a corrupt record from one written with another schema
    /// version; use the plain getters for fail-closed reads.
    pub fn load(&self) -> SessionResult<Option<StoredSession<U>>> {
        let raw = match self.store.get(&self.config.record_key())? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| SessionError::corrupt(format!("not valid JSON: {}", e)))?;

        let found = value.get("v").and_then(Value::as_u64);
        if found != Some(u64::from(SESSION_RECORD_VERSION)) {
            return Err(SessionError::SchemaMismatch {
                found,
                expected: SESSION_RECORD_VERSION,
            });
        }

        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| SessionError::corrupt(format!("unexpected shape: {}", e)))
    }

    /// Current session; an unreadable record counts as no session
    pub fn snapshot(&self) -> SessionResult<Session<U>> {
        let record = self.load_or_empty()?;
        Ok(Session {
            token: record.token,
            user: record.user,
        })
    }

    fn load_or_empty(&self) -> SessionResult<StoredSession<U>> {
        match self.load() {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Ok(StoredSession::empty()),
            Err(e) if e.is_unreadable_record() => {
                warn!(
                    namespace = %self.config.namespace,
                    kind = e.kind(),
                    error = %e,
                    "Ignoring unreadable session record"
                );
                Ok(StoredSession::empty())
            }
            Err(e) => Err(e),
        }
    }

    fn save(&self, record: &StoredSession<U>) -> SessionResult<()> {
        let key = self.config.record_key();
        if record.is_empty() {
            return self.store.remove(&key);
        }
        let data = serde_json::to_string(record)?;
        self.store.set(&key, &data, &self.config.options)
    }

    /// Write token and user together; this is what a successful login does
    pub fn start_session(&self, token: &str, user: U) -> SessionResult<()> {
        let record = StoredSession {
            version: SESSION_RECORD_VERSION,
            token: Some(token.to_string()),
            user: Some(user),
        };
        self.save(&record)?;
        info!(namespace = %self.config.namespace, "Session started");
        Ok(())
    }

    pub fn set_token(&self, token: &str) -> SessionResult<()> {
        let mut record = self.load_or_empty()?;
        record.token = Some(token.to_string());
        self.save(&record)
    }

    pub fn get_token(&self) -> SessionResult<Option<String>> {
        Ok(self.load_or_empty()?.token)
    }

    pub fn set_user(&self, user: U) -> SessionResult<()> {
        let mut record = self.load_or_empty()?;
        record.user = Some(user);
        self.save(&record)
    }

    pub fn get_user(&self) -> SessionResult<Option<U>> {
        Ok(self.load_or_empty()?.user)
    }

    pub fn remove_token(&self) -> SessionResult<()> {
        let mut record = self.load_or_empty()?;
        record.token = None;
        self.save(&record)
    }

    pub fn remove_user(&self) -> SessionResult<()> {
        let mut record = self.load_or_empty()?;
        record.user = None;
        self.save(&record)
    }

    /// Drop the whole session in one removal
    pub fn clear_session(&self) -> SessionResult<()> {
        self.store.remove(&self.config.record_key())?;
        info!(namespace = %self.config.namespace, "Session cleared");
        Ok(())
    }

    /// Presence check only: both token and user must be stored
    pub fn is_authenticated(&self) -> SessionResult<bool> {
        Ok(self.snapshot()?.is_authenticated())
    }
}
