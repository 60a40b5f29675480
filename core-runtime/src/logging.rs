//! Structured logging for the `metalwall` binary and its crates.
//!
//! Events go to stderr through `tracing-subscriber` so that `--json` output
//! on stdout stays parseable. The `[logging]` config section picks the level
//! and format; an explicit `filter` replaces the generated directives.
//!
//! Provider credentials travel in headers and query strings, so anything
//! that logs a request URL or a config value passes it through
//! [`redact_url`] or [`redact_if_sensitive`] first.

use crate::error::{Error, Result};

use serde::{Deserialize, Serialize};
use std::io;
use tracing_subscriber::{
    filter::EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry,
};

const REDACTED: &str = "[REDACTED]";

/// Field names whose values never reach a log line.
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "secret",
    "token",
    "api_key",
    "authorization",
    "bearer",
];

/// Our crates log at the configured level.
const WALL_TARGETS: &[&str] = &[
    "metalwall",
    "core_runtime",
    "core_wall",
    "core_metadata",
    "core_discovery",
    "core_auth",
    "core_service",
    "bridge_native",
];

/// Chatty dependencies held at `warn` whatever the level.
const NOISY_TARGETS: &[&str] = &["sqlx", "reqwest", "hyper", "h2", "html5ever", "selectors"];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, for a developer terminal
    Pretty,
    /// One object per line
    Json,
    /// One line per event
    Compact,
}

impl Default for LogFormat {
    /// Compact for the CLI; JSON is opt-in for log shippers.
    fn default() -> Self {
        Self::Compact
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: LogLevel,
    /// `EnvFilter` directives used verbatim instead of the generated ones
    pub filter: Option<String>,
    /// Print the emitting module next to each event
    pub display_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::default(),
            filter: None,
            display_target: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Directives handed to `EnvFilter`.
    pub fn directives(&self) -> String {
        if let Some(filter) = &self.filter {
            return filter.clone();
        }

        let level = self.level.as_str();
        let ours = WALL_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level));
        let quiet = NOISY_TARGETS.iter().map(|target| format!("{}=warn", target));

        std::iter::once("warn".to_string())
            .chain(ours)
            .chain(quiet)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber. Only the first call in a process succeeds.
///
/// # Errors
///
/// [`Error::Config`] when the filter does not parse or a subscriber is
/// already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.directives())
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))?;

    let base = fmt::layer()
        .with_writer(io::stderr)
        .with_target(config.display_target);
    let output: Box<dyn Layer<Registry> + Send + Sync> = match config.format {
        LogFormat::Pretty => base.pretty().boxed(),
        LogFormat::Compact => base.compact().boxed(),
        LogFormat::Json => base.json().flatten_event(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Logging already initialized: {}", e)))
}

/// Mask `value` when `field` names a credential; shorten e-mail addresses
/// to their first character.
///
/// ```
/// use core_runtime::logging::redact_if_sensitive;
///
/// assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
/// assert_eq!(redact_if_sensitive("email", "nocturno@culto.example"), "n***@[REDACTED]");
/// assert_eq!(redact_if_sensitive("artist", "Darkthrone"), "Darkthrone");
/// ```
pub fn redact_if_sensitive(field: &str, value: &str) -> String {
    let field = field.to_ascii_lowercase();
    if SENSITIVE_FIELDS.iter().any(|name| field.contains(name)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') && !value.contains("://") => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, REDACTED)
        }
        _ => value.to_string(),
    }
}

/// Mask credential query parameters, e.g. the Last.fm `api_key`.
///
/// ```
/// use core_runtime::logging::redact_url;
///
/// assert_eq!(
///     redact_url("https://ws.audioscrobbler.com/2.0/?method=tag.gettopalbums&api_key=k"),
///     "https://ws.audioscrobbler.com/2.0/?method=tag.gettopalbums&api_key=[REDACTED]"
/// );
/// ```
pub fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };

    let query = query
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) if redact_if_sensitive(key, value) == REDACTED => {
                format!("{}={}", key, REDACTED)
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join("&");

    format!("{}?{}", base, query)
}
