//! Credential Store - cookie-style key/value persistence
//!
//! Values are plain strings. Every entry carries the options it was written
//! with (expiry, secure, same-site, path); expired entries read as absent.
//! Nothing is encrypted, confidentiality relies on the transport.

use crate::{SessionError, SessionResult};
use chrono::{DateTime, Duration, Utc};
use nutriadmin_core::{redact_secret, SameSite, SessionSettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Options applied when writing an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieOptions {
    pub expiry_days: u32,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expiry_days: 7,
            secure: false,
            same_site: SameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookieOptions {
    /// Build options from session settings; `secure` comes from the environment
    pub fn from_settings(settings: &SessionSettings, secure: bool) -> Self {
        Self {
            expiry_days: settings.expiry_days,
            secure,
            same_site: settings.same_site,
            path: settings.path.clone(),
        }
    }

    pub fn with_expiry_days(mut self, days: u32) -> Self {
        self.expiry_days = days;
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = path.into();
        self
    }
}

/// A persisted entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl StoredCookie {
    fn new(value: &str, options: &CookieOptions, now: DateTime<Utc>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: now + Duration::days(i64::from(options.expiry_days)),
            secure: options.secure,
            same_site: options.same_site,
            path: options.path.clone(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// An entry is visible when its path is a prefix of the reader's scope
    fn visible_from(&self, scope: &str) -> bool {
        scope.starts_with(self.path.as_str())
    }
}

/// Key/value persistence with cookie semantics
pub trait CredentialStore: Send + Sync {
    /// Write `value` under `key`
    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> SessionResult<()>;

    /// Read the value under `key`; expired or out-of-scope entries are absent
    fn get(&self, key: &str) -> SessionResult<Option<String>>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> SessionResult<()>;
}

/// Shared lookup logic: returns the value and whether the map needs pruning
fn lookup(
    entries: &HashMap<String, StoredCookie>,
    key: &str,
    scope: &str,
    now: DateTime<Utc>,
) -> (Option<String>, bool) {
    match entries.get(key) {
        Some(cookie) if cookie.is_expired(now) => (None, true),
        Some(cookie) if cookie.visible_from(scope) => (Some(cookie.value.clone()), false),
        _ => (None, false),
    }
}

/// In-process cookie jar
#[derive(Debug)]
pub struct MemoryCookieJar {
    entries: RwLock<HashMap<String, StoredCookie>>,
    scope: String,
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCookieJar {
    /// Jar that sees every path
    pub fn new() -> Self {
        Self::with_scope("/")
    }

    /// Jar that only sees entries whose path prefixes `scope`
    pub fn with_scope<S: Into<String>>(scope: S) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            scope: scope.into(),
        }
    }

    /// Raw entry, including metadata, for inspection
    pub fn entry(&self, key: &str) -> Option<StoredCookie> {
        self.entries.read().ok()?.get(key).cloned()
    }

    /// Insert a pre-built entry, e.g. one that is already expired
    pub fn insert_raw(&self, key: &str, cookie: StoredCookie) -> SessionResult<()> {
        self.entries
            .write()
            .map_err(|_| SessionError::storage("cookie jar lock poisoned"))?
            .insert(key.to_string(), cookie);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCookieJar {
    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> SessionResult<()> {
        let cookie = StoredCookie::new(value, options, Utc::now());
        self.entries
            .write()
            .map_err(|_| SessionError::storage("cookie jar lock poisoned"))?
            .insert(key.to_string(), cookie);

        debug!(key, value = %redact_secret(value), "Stored credential entry");
        Ok(())
    }

    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let now = Utc::now();
        let (value, expired) = {
            let entries = self
                .entries
                .read()
                .map_err(|_| SessionError::storage("cookie jar lock poisoned"))?;
            lookup(&entries, key, &self.scope, now)
        };

        if expired {
            debug!(key, "Credential entry expired, purging");
            self.remove(key)?;
        } else {
            debug!(key, present = value.is_some(), "Read credential entry");
        }

        Ok(value)
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.entries
            .write()
            .map_err(|_| SessionError::storage("cookie jar lock poisoned"))?
            .remove(key);

        debug!(key, "Removed credential entry");
        Ok(())
    }
}

/// On-disk layout of a [`FileCookieJar`]
#[derive(Debug, Default, Serialize, Deserialize)]
struct JarFile {
    entries: HashMap<String, StoredCookie>,
}

/// Cookie jar persisted as a JSON file, so a session survives between runs.
///
/// Every write replaces the whole file through a temporary sibling and a
/// rename, so readers never observe a half-written jar.
#[derive(Debug)]
pub struct FileCookieJar {
    path: PathBuf,
    scope: String,
    guard: Mutex<()>,
}

impl FileCookieJar {
    /// Open (or lazily create) a jar at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> SessionResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Cookie jar at: {}", path.display());

        Ok(Self {
            path,
            scope: "/".to_string(),
            guard: Mutex::new(()),
        })
    }

    /// Restrict visibility to entries whose path prefixes `scope`
    pub fn with_scope<S: Into<String>>(mut self, scope: S) -> Self {
        self.scope = scope.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jar(&self) -> SessionResult<JarFile> {
        if !self.path.exists() {
            return Ok(JarFile::default());
        }

        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(JarFile::default());
        }

        serde_json::from_str(&data).map_err(|e| {
            SessionError::storage(format!(
                "cookie jar {} is unreadable: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_jar(&self, jar: &JarFile) -> SessionResult<()> {
        let data = serde_json::to_string_pretty(jar)?;
        let tmp = self.path.with_extension("json.tmp");

        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> SessionResult<std::sync::MutexGuard<'_, ()>> {
        self.guard
            .lock()
            .map_err(|_| SessionError::storage("cookie jar lock poisoned"))
    }
}

impl CredentialStore for FileCookieJar {
    fn set(&self, key: &str, value: &str, options: &CookieOptions) -> SessionResult<()> {
        let _guard = self.lock()?;
        let mut jar = self.read_jar()?;
        jar.entries.insert(
            key.to_string(),
            StoredCookie::new(value, options, Utc::now()),
        );
        self.write_jar(&jar)?;

        debug!(key, value = %redact_secret(value), path = %self.path.display(), "Stored credential entry");
        Ok(())
    }

    fn get(&self, key: &str) -> SessionResult<Option<String>> {
        let _guard = self.lock()?;
        let mut jar = self.read_jar()?;
        let (value, expired) = lookup(&jar.entries, key, &self.scope, Utc::now());

        if expired {
            debug!(key, "Credential entry expired, purging");
            jar.entries.remove(key);
            self.write_jar(&jar)?;
        } else {
            debug!(key, present = value.is_some(), "Read credential entry");
        }

        Ok(value)
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        let _guard = self.lock()?;
        let mut jar = self.read_jar()?;
        if jar.entries.remove(key).is_some() {
            self.write_jar(&jar)?;
        }

        debug!(key, "Removed credential entry");
        Ok(())
    }
}
