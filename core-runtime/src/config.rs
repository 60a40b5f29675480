//! # Core Configuration Module
//!
//! Provides configuration management for the Metal Wall core.
//!
//! ## Overview
//!
//! An [`AppConfig`] can be assembled three ways, all of which end in the same
//! fail-fast [`AppConfig::validate`] call:
//!
//! - programmatically through [`AppConfig::builder`]
//! - from a TOML document via [`AppConfig::from_toml_str`] / [`AppConfig::from_file`]
//! - either of the above followed by [`AppConfig::apply_env_overrides`]
//!
//! ## Usage
//!
//! ### Builder
//!
//! ```
//! use core_runtime::config::AppConfig;
//!
//! let config = AppConfig::builder()
//!     .database_path("/var/lib/metalwall/wall.db")
//!     .secret("a-long-random-signing-secret")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ### TOML
//!
//! ```toml
//! database_path = "metalwall.db"
//! secret = "a-long-random-signing-secret"
//!
//! [[users]]
//! username = "admin"
//! password_sha256 = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"
//!
//! [metadata_api]
//! lastfm_api_key = "..."
//! rate_limit_delay_ms = 250
//!
//! [discovery]
//! max_attempts = 10
//! identity_match = { mode = "fuzzy", threshold = 0.85 }
//!
//! [logging]
//! format = "compact"
//! level = "debug"
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::AppConfig;
//!
//! // Panics: the database path is mandatory
//! let config = AppConfig::builder()
//!     .build()
//!     .expect("Should fail - missing database path");
//! ```

use crate::error::{Error, Result};
use crate::logging::{redact_if_sensitive, LogFormat, LogLevel, LoggingConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Environment variables consulted by [`AppConfig::apply_env_overrides`].
pub const ENV_DATABASE: &str = "METALWALL_DATABASE";
pub const ENV_SECRET: &str = "METALWALL_SECRET";
pub const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
pub const ENV_LASTFM_API_KEY: &str = "LASTFM_API_KEY";

const MIN_SECRET_LEN: usize = 16;

/// Application configuration for the Metal Wall core.
///
/// Use [`AppConfigBuilder`] or the TOML loaders to construct instances.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database file
    pub database_path: PathBuf,

    /// Secret used to sign "remember me" tokens. Empty disables them.
    #[serde(default)]
    pub secret: String,

    /// Maximum age of a remember-me token in days
    #[serde(default = "default_remember_days")]
    pub remember_days: u32,

    /// Accounts allowed to sign in
    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// External metadata API configuration (Spotify, Last.fm)
    #[serde(default)]
    pub metadata_api: MetadataApiConfig,

    /// Random discovery tuning
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database_path", &self.database_path)
            .field("secret", &redact_if_sensitive("secret", &self.secret))
            .field("remember_days", &self.remember_days)
            .field(
                "users",
                &self.users.iter().map(|u| &u.username).collect::<Vec<_>>(),
            )
            .field("metadata_api", &self.metadata_api)
            .field("discovery", &self.discovery)
            .field("logging", &self.logging)
            .finish()
    }
}

fn default_remember_days() -> u32 {
    30
}

/// A configured account.
///
/// Passwords are never stored in clear: `password_sha256` is the lowercase
/// hex SHA-256 digest of the password.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password_sha256: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserConfig {
    pub fn new(username: impl Into<String>, password_sha256: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password_sha256: password_sha256.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

impl std::fmt::Debug for UserConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserConfig")
            .field("username", &self.username)
            .field("password_sha256", &"[REDACTED]")
            .field(
                "email",
                &self
                    .email
                    .as_deref()
                    .map(|e| redact_if_sensitive("email", e)),
            )
            .finish()
    }
}

/// Configuration for external metadata API services.
///
/// Spotify is used for artist search, related artists and release lookup.
/// Last.fm supplies similar artists and genre tags. Both are optional: the
/// discovery feature degrades to whatever is configured.
///
/// # Security Note
///
/// API credentials should never be hardcoded in the binary. Load them from
/// the environment (see [`AppConfig::apply_env_overrides`]) or a config file
/// kept outside version control.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataApiConfig {
    /// Spotify client-credentials application id
    #[serde(default)]
    pub spotify_client_id: Option<String>,

    /// Spotify client-credentials application secret
    #[serde(default)]
    pub spotify_client_secret: Option<String>,

    /// Last.fm API key
    ///
    /// Obtain an API key from: https://www.last.fm/api/account/create
    #[serde(default)]
    pub lastfm_api_key: Option<String>,

    /// Minimum delay in milliseconds between two calls to the same API
    #[serde(default = "default_rate_limit_delay_ms")]
    pub rate_limit_delay_ms: u64,
}

fn default_rate_limit_delay_ms() -> u64 {
    250
}

impl Default for MetadataApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("MetadataApiConfig")
            .field("spotify_client_id", &self.spotify_client_id)
            .field("spotify_client_secret", &redact(&self.spotify_client_secret))
            .field("lastfm_api_key", &redact(&self.lastfm_api_key))
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .finish()
    }
}

impl MetadataApiConfig {
    /// Creates a new MetadataApiConfig with no API keys configured
    pub fn new() -> Self {
        Self {
            spotify_client_id: None,
            spotify_client_secret: None,
            lastfm_api_key: None,
            rate_limit_delay_ms: default_rate_limit_delay_ms(),
        }
    }

    /// Sets the Spotify client credentials
    pub fn with_spotify_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.spotify_client_id = Some(client_id.into());
        self.spotify_client_secret = Some(client_secret.into());
        self
    }

    /// Sets the Last.fm API key
    pub fn with_lastfm_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.lastfm_api_key = Some(api_key.into());
        self
    }

    /// Sets the rate limit delay in milliseconds
    pub fn with_rate_limit_delay_ms(mut self, delay_ms: u64) -> Self {
        self.rate_limit_delay_ms = delay_ms;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(id), Some(secret)) => {
                if id.trim().is_empty() || secret.trim().is_empty() {
                    return Err(Error::Config(
                        "Spotify client id and secret cannot be empty".to_string(),
                    ));
                }
            }
            (None, None) => {}
            _ => {
                return Err(Error::Config(
                    "Spotify requires both client id and client secret. \
                     Set SPOTIFY_CLIENT_ID and SPOTIFY_CLIENT_SECRET together."
                        .to_string(),
                ));
            }
        }

        if let Some(ref key) = self.lastfm_api_key {
            if key.trim().is_empty() {
                return Err(Error::Config("Last.fm API key cannot be empty".to_string()));
            }
        }

        if self.rate_limit_delay_ms > 60000 {
            return Err(Error::Config(
                "Rate limit delay exceeds maximum of 60 seconds (60,000ms)".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks if Spotify is configured
    pub fn has_spotify(&self) -> bool {
        self.spotify_client_id.is_some() && self.spotify_client_secret.is_some()
    }

    /// Checks if Last.fm is configured
    pub fn has_lastfm(&self) -> bool {
        self.lastfm_api_key.is_some()
    }
}

/// How strictly a discovered artist name must match the requested one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum IdentityMatchConfig {
    /// Normalized names must be equal
    Exact,
    /// Also accept containment or a similarity score at or above `threshold`
    Fuzzy { threshold: f64 },
}

impl Default for IdentityMatchConfig {
    fn default() -> Self {
        Self::Exact
    }
}

/// Random discovery settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Candidate budget before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default)]
    pub identity_match: IdentityMatchConfig,

    /// Look the discovered album up on Bandcamp
    #[serde(default = "default_true")]
    pub bandcamp_lookup: bool,
}

fn default_max_attempts() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            identity_match: IdentityMatchConfig::default(),
            bandcamp_lookup: true,
        }
    }
}

impl DiscoveryConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 || self.max_attempts > 100 {
            return Err(Error::Config(
                "Discovery max_attempts must be between 1 and 100".to_string(),
            ));
        }

        if let IdentityMatchConfig::Fuzzy { threshold } = self.identity_match {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(Error::Config(format!(
                    "Fuzzy identity threshold must be in (0, 1], got {}",
                    threshold
                )));
            }
        }

        Ok(())
    }
}

/// Serializable logging section, converted into a [`LoggingConfig`] at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    #[serde(default)]
    pub format: Option<LogFormat>,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub filter: Option<String>,
}

impl LoggingSettings {
    pub fn to_logging_config(&self) -> LoggingConfig {
        let mut config = LoggingConfig::default().with_level(self.level);
        if let Some(format) = self.format {
            config = config.with_format(format);
        }
        if let Some(ref filter) = self.filter {
            config = config.with_filter(filter.clone());
        }
        config
    }
}

impl AppConfig {
    /// Creates a new builder for constructing an `AppConfig`.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(input)
            .map_err(|e| Error::Config(format!("Invalid configuration file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Overrides values from the process environment, then re-validates.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `METALWALL_DATABASE` | `database_path` |
    /// | `METALWALL_SECRET` | `secret` |
    /// | `SPOTIFY_CLIENT_ID` | `metadata_api.spotify_client_id` |
    /// | `SPOTIFY_CLIENT_SECRET` | `metadata_api.spotify_client_secret` |
    /// | `LASTFM_API_KEY` | `metadata_api.lastfm_api_key` |
    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an
    /// injectable lookup.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = non_empty(ENV_DATABASE) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(secret) = non_empty(ENV_SECRET) {
            self.secret = secret;
        }
        if let Some(id) = non_empty(ENV_SPOTIFY_CLIENT_ID) {
            self.metadata_api.spotify_client_id = Some(id);
        }
        if let Some(secret) = non_empty(ENV_SPOTIFY_CLIENT_SECRET) {
            self.metadata_api.spotify_client_secret = Some(secret);
        }
        if let Some(key) = non_empty(ENV_LASTFM_API_KEY) {
            self.metadata_api.lastfm_api_key = Some(key);
        }

        self.validate()?;
        Ok(self)
    }

    /// Whether remember-me tokens can be issued.
    pub fn remember_enabled(&self) -> bool {
        !self.secret.is_empty()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database path is not empty
    /// - The signing secret is long enough when set
    /// - Usernames are unique and password digests are 64 hex chars
    /// - API and discovery sections are consistent
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        if !self.secret.is_empty() && self.secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "Secret must be at least {} characters (or empty to disable remember-me)",
                MIN_SECRET_LEN
            )));
        }

        if self.remember_days == 0 {
            return Err(Error::Config(
                "remember_days must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            let username = user.username.trim();
            if username.is_empty() {
                return Err(Error::Config("Username cannot be empty".to_string()));
            }
            if !seen.insert(username.to_string()) {
                return Err(Error::Config(format!(
                    "Duplicate user '{}' in configuration",
                    username
                )));
            }
            let digest = &user.password_sha256;
            if digest.len() != 64 || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(Error::Config(format!(
                    "User '{}' must have a 64-character hex password_sha256",
                    username
                )));
            }
        }

        self.metadata_api.validate()?;
        self.discovery.validate()?;

        Ok(())
    }
}

/// Builder for [`AppConfig`]
#[derive(Default)]
pub struct AppConfigBuilder {
    database_path: Option<PathBuf>,
    secret: Option<String>,
    remember_days: Option<u32>,
    users: Vec<UserConfig>,
    metadata_api: Option<MetadataApiConfig>,
    discovery: Option<DiscoveryConfig>,
    logging: Option<LoggingSettings>,
}

impl AppConfigBuilder {
    /// Sets the database path.
    ///
    /// ```
    /// use core_runtime::config::AppConfig;
    ///
    /// let builder = AppConfig::builder()
    ///     .database_path("/path/to/wall.db");
    /// ```
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Sets the remember-me signing secret.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Sets the maximum age of remember-me tokens.
    ///
    /// Default: 30 days
    pub fn remember_days(mut self, days: u32) -> Self {
        self.remember_days = Some(days);
        self
    }

    /// Adds an account.
    pub fn user(mut self, user: UserConfig) -> Self {
        self.users.push(user);
        self
    }

    pub fn metadata_api_config(mut self, config: MetadataApiConfig) -> Self {
        self.metadata_api = Some(config);
        self
    }

    pub fn discovery_config(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = Some(config);
        self
    }

    pub fn logging(mut self, settings: LoggingSettings) -> Self {
        self.logging = Some(settings);
        self
    }

    /// Builds the final `AppConfig` instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database path is missing or any section
    /// fails [`AppConfig::validate`].
    pub fn build(self) -> Result<AppConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let config = AppConfig {
            database_path,
            secret: self.secret.unwrap_or_default(),
            remember_days: self.remember_days.unwrap_or_else(default_remember_days),
            users: self.users,
            metadata_api: self.metadata_api.unwrap_or_default(),
            discovery: self.discovery.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // sha256("admin")
    const ADMIN_DIGEST: &str = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918";

    #[test]
    fn test_builder_requires_database_path() {
        let result = AppConfig::builder().secret("0123456789abcdef").build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Database path is required"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = AppConfig::builder()
            .database_path("wall.db")
            .build()
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("wall.db"));
        assert_eq!(config.remember_days, 30);
        assert!(!config.remember_enabled());
        assert_eq!(config.discovery.max_attempts, 10);
        assert_eq!(config.discovery.identity_match, IdentityMatchConfig::Exact);
        assert!(config.discovery.bandcamp_lookup);
        assert_eq!(config.metadata_api.rate_limit_delay_ms, 250);
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let result = AppConfig::builder()
            .database_path("wall.db")
            .secret("short")
            .build();

        assert!(result.unwrap_err().to_string().contains("Secret must be"));
    }

    #[test]
    fn test_validate_rejects_duplicate_users() {
        let result = AppConfig::builder()
            .database_path("wall.db")
            .user(UserConfig::new("admin", ADMIN_DIGEST))
            .user(UserConfig::new("admin", ADMIN_DIGEST))
            .build();

        assert!(result.unwrap_err().to_string().contains("Duplicate user"));
    }

    #[test]
    fn test_validate_rejects_malformed_digest() {
        let result = AppConfig::builder()
            .database_path("wall.db")
            .user(UserConfig::new("admin", "admin"))
            .build();

        assert!(result.unwrap_err().to_string().contains("password_sha256"));
    }

    #[test]
    fn test_spotify_requires_both_credentials() {
        let mut api = MetadataApiConfig::new();
        api.spotify_client_id = Some("id".to_string());

        let err = api.validate().unwrap_err();
        assert!(err.to_string().contains("both client id and client secret"));

        let api = MetadataApiConfig::new().with_spotify_credentials("id", "secret");
        assert!(api.validate().is_ok());
        assert!(api.has_spotify());
        assert!(!api.has_lastfm());
    }

    #[test]
    fn test_validate_rejects_excessive_rate_limit() {
        let api = MetadataApiConfig::new().with_rate_limit_delay_ms(120_000);
        assert!(api.validate().is_err());
    }

    #[test]
    fn test_discovery_validation() {
        let zero = DiscoveryConfig {
            max_attempts: 0,
            ..DiscoveryConfig::default()
        };
        assert!(zero.validate().is_err());

        let bad_threshold = DiscoveryConfig {
            identity_match: IdentityMatchConfig::Fuzzy { threshold: 1.5 },
            ..DiscoveryConfig::default()
        };
        assert!(bad_threshold.validate().is_err());

        let fuzzy = DiscoveryConfig {
            identity_match: IdentityMatchConfig::Fuzzy { threshold: 0.85 },
            ..DiscoveryConfig::default()
        };
        assert!(fuzzy.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let toml = format!(
            r#"
            database_path = "metalwall.db"
            secret = "0123456789abcdef0123"

            [[users]]
            username = "admin"
            password_sha256 = "{}"
            email = "admin@example.com"

            [metadata_api]
            lastfm_api_key = "lfm"
            rate_limit_delay_ms = 500

            [discovery]
            max_attempts = 5
            identity_match = {{ mode = "fuzzy", threshold = 0.9 }}
            bandcamp_lookup = false

            [logging]
            format = "compact"
            level = "debug"
            "#,
            ADMIN_DIGEST
        );

        let config = AppConfig::from_toml_str(&toml).unwrap();

        assert_eq!(config.users.len(), 1);
        assert_eq!(config.users[0].email.as_deref(), Some("admin@example.com"));
        assert_eq!(config.metadata_api.lastfm_api_key.as_deref(), Some("lfm"));
        assert_eq!(config.metadata_api.rate_limit_delay_ms, 500);
        assert_eq!(config.discovery.max_attempts, 5);
        assert_eq!(
            config.discovery.identity_match,
            IdentityMatchConfig::Fuzzy { threshold: 0.9 }
        );
        assert!(!config.discovery.bandcamp_lookup);
        assert_eq!(config.logging.format, Some(LogFormat::Compact));
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(config.remember_enabled());
    }

    #[test]
    fn test_from_toml_str_minimal() {
        let config = AppConfig::from_toml_str(r#"database_path = "wall.db""#).unwrap();
        assert!(config.users.is_empty());
        assert_eq!(config.discovery, DiscoveryConfig::default());
    }

    #[test]
    fn test_from_toml_str_rejects_garbage() {
        let err = AppConfig::from_toml_str("database_path = [").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration file"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/metalwall.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigFile { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_DATABASE, "/data/wall.db"),
            (ENV_SPOTIFY_CLIENT_ID, "sp-id"),
            (ENV_SPOTIFY_CLIENT_SECRET, "sp-secret"),
            (ENV_LASTFM_API_KEY, "lfm-key"),
            (ENV_SECRET, "override-secret-value"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::builder()
            .database_path("wall.db")
            .build()
            .unwrap()
            .apply_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/data/wall.db"));
        assert!(config.metadata_api.has_spotify());
        assert_eq!(config.metadata_api.lastfm_api_key.as_deref(), Some("lfm-key"));
        assert_eq!(config.secret, "override-secret-value");
    }

    #[test]
    fn test_env_overrides_ignore_blank_values() {
        let config = AppConfig::builder()
            .database_path("wall.db")
            .build()
            .unwrap()
            .apply_overrides_from(|k| (k == ENV_DATABASE).then(|| "  ".to_string()))
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("wall.db"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::builder()
            .database_path("wall.db")
            .secret("super-secret-signing-key")
            .metadata_api_config(MetadataApiConfig::new().with_lastfm_api_key("lfm-key"))
            .user(UserConfig::new("admin", ADMIN_DIGEST))
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret-signing-key"));
        assert!(!rendered.contains("lfm-key"));
        assert!(!rendered.contains(ADMIN_DIGEST));
        assert!(rendered.contains("admin"));
    }

    #[test]
    fn test_logging_settings_conversion() {
        let settings = LoggingSettings {
            format: Some(LogFormat::Json),
            level: LogLevel::Warn,
            filter: Some("core_wall=trace".to_string()),
        };

        let config = settings.to_logging_config();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.filter.as_deref(), Some("core_wall=trace"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = AppConfig::builder()
            .database_path("wall.db")
            .build()
            .unwrap();
        let cloned = config.clone();
        assert_eq!(config, cloned);
    }
}
