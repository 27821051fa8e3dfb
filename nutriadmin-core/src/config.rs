//! Configuration management
//!
//! Defaults, then an optional TOML file, then environment variables. The
//! binary applies command-line overrides on top.

use crate::error::{ErrorContext, NutriError, NutriResult};
use crate::logging::LoggingConfig;
use crate::types::{Environment, SameSite};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting the backend address
pub const API_URL_ENV: &str = "NUTRIADMIN_API_URL";
/// Environment variable selecting the deployment environment
pub const ENVIRONMENT_ENV: &str = "NUTRIADMIN_ENV";
/// Backend address used when nothing else is configured
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Complete console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub environment: Environment,
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub auth_path: String,
    pub storage_path: String,
    pub inventory_path: String,
    pub json_timeout_seconds: u64,
    /// Uploads get a longer budget than plain JSON calls
    pub multipart_timeout_seconds: u64,
    pub user_agent: String,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Key namespace; independent sessions use different namespaces
    pub namespace: String,
    pub expiry_days: u32,
    pub same_site: SameSite,
    pub path: String,
    /// Where the cookie jar is persisted (None = user data dir)
    pub cookie_file: Option<PathBuf>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiSettings::default(),
            session: SessionSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            auth_path: "/auth".to_string(),
            storage_path: "/storage".to_string(),
            inventory_path: "/inventory".to_string(),
            json_timeout_seconds: 10,
            multipart_timeout_seconds: 60,
            user_agent: format!("nutriadmin/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            namespace: "nutriadmin".to_string(),
            expiry_days: 7,
            same_site: SameSite::Lax,
            path: "/".to_string(),
            cookie_file: None,
        }
    }
}

impl SessionSettings {
    /// Cookie jar location, falling back to the platform data directory
    pub fn resolved_cookie_file(&self) -> PathBuf {
        self.cookie_file.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("nutriadmin")
                .join("cookies.json")
        })
    }
}

impl AdminConfig {
    /// Default configuration file location
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nutriadmin")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> NutriResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| NutriError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| NutriError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> NutriResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| NutriError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content).map_err(|e| NutriError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })
    }

    /// Load the file if it exists, then apply environment overrides
    pub fn load(path: Option<&Path>) -> NutriResult<Self> {
        let default_path = Self::default_path();
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None if default_path.exists() => Self::from_file(&default_path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay `NUTRIADMIN_API_URL` and `NUTRIADMIN_ENV` when set
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api.base_url = url.trim().to_string();
            }
        }
        if let Ok(env) = std::env::var(ENVIRONMENT_ENV) {
            match env.parse() {
                Ok(parsed) => self.environment = parsed,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENVIRONMENT_ENV, e),
            }
        }
    }

    /// Cookies are marked secure only in production-like environments
    pub fn secure_cookies(&self) -> bool {
        self.environment.is_production()
    }

    /// Validate configuration
    pub fn validate(&self) -> NutriResult<()> {
        let parsed = url::Url::parse(&self.api.base_url).map_err(|e| NutriError::Config {
            message: format!("Invalid api.base_url '{}': {}", self.api.base_url, e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("validate")
                .with_suggestion("Use an absolute http(s) URL, e.g. http://localhost:4000"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(NutriError::Config {
                message: format!("Unsupported scheme in api.base_url: {}", parsed.scheme()),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use http or https"),
            });
        }

        if self.api.json_timeout_seconds == 0 || self.api.multipart_timeout_seconds == 0 {
            return Err(NutriError::Config {
                message: "API timeouts must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set api.*_timeout_seconds to a positive value"),
            });
        }

        if self.session.expiry_days == 0 {
            return Err(NutriError::Config {
                message: "Session expiry_days must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.expiry_days to a positive value"),
            });
        }

        if self.session.namespace.trim().is_empty() {
            return Err(crate::config_error!(
                "Session namespace cannot be empty",
                "config"
            ));
        }

        Ok(())
    }
}
