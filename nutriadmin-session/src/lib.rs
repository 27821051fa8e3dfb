//! Session persistence for the nutriadmin console
//!
//! A [`CredentialStore`] keeps cookie-like entries with expiry and scope; the
//! [`SessionService`] layers a typed, versioned session record on top of it.

pub mod service;
pub mod store;

pub use service::{
    Session, SessionConfig, SessionService, StoredSession, UserRecord, SESSION_RECORD_VERSION,
};
pub use store::{CookieOptions, CredentialStore, FileCookieJar, MemoryCookieJar, StoredCookie};

use nutriadmin_core::{ErrorContext, NutriError};
use thiserror::Error;

/// Session and credential store errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Credential storage error: {message}")]
    Storage { message: String },

    #[error("Stored session is corrupt: {message}")]
    Corrupt { message: String },

    #[error("Stored session has schema version {found:?}, expected {expected}")]
    SchemaMismatch { found: Option<u64>, expected: u32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type SessionResult<T> = Result<T, SessionError>;

impl SessionError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a corruption error
    pub fn corrupt<S: Into<String>>(message: S) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Errors about the stored record itself; readers treat these as "no session"
    pub fn is_unreadable_record(&self) -> bool {
        matches!(
            self,
            SessionError::Corrupt { .. } | SessionError::SchemaMismatch { .. }
        )
    }

    /// Short machine-readable kind for log fields
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Storage { .. } => "storage",
            SessionError::Corrupt { .. } => "corrupt",
            SessionError::SchemaMismatch { .. } => "schema_mismatch",
            SessionError::Io(_) => "io",
            SessionError::Serialization(_) => "serialization",
        }
    }
}

impl From<SessionError> for NutriError {
    fn from(error: SessionError) -> Self {
        let context = ErrorContext::new("session").with_metadata("kind", error.kind());
        let context = if error.is_unreadable_record() {
            context.with_suggestion("Run 'nutriadmin logout' to discard the stored session")
        } else {
            context
        };
        NutriError::Storage {
            message: error.to_string(),
            source: Some(Box::new(error)),
            context,
        }
    }
}
