use std::env;
use std::io;

use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::error::SetupError;
use crate::formatting_layer::JsonLogLayer;
use crate::storage::StorageLayer;

/// Builder for configuring structured JSON logging
pub struct StructLogBuilder {
    application: String,
    version: String,
    hostname: Option<String>,
    json_enabled: bool,
    default_level: LevelFilter,
    sensitive: Vec<String>,
}

impl StructLogBuilder {
    /// Create a new builder with required application name and version
    pub fn new(application: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            version: version.into(),
            hostname: None,
            json_enabled: true,
            default_level: LevelFilter::INFO,
            sensitive: Vec::new(),
        }
    }

    /// Set a custom hostname (defaults to system hostname)
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Enable or disable JSON output (defaults to true)
    pub fn json_enabled(mut self, enabled: bool) -> Self {
        self.json_enabled = enabled;
        self
    }

    /// Read JSON_LOG env var to determine if JSON should be enabled
    pub fn json_from_env(mut self) -> Self {
        self.json_enabled = env::var("JSON_LOG").is_ok_and(|s| s.parse().unwrap_or_default());
        self
    }

    /// Level used when `RUST_LOG` is not set (defaults to info)
    pub fn default_level(mut self, level: LevelFilter) -> Self {
        self.default_level = level;
        self
    }

    /// Extra field names redacted in JSON output
    pub fn redact<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive.extend(fields.into_iter().map(Into::into));
        self
    }

    fn env_filter(&self) -> Result<EnvFilter, SetupError> {
        EnvFilter::builder()
            .with_default_directive(self.default_level.into())
            .from_env()
            .map_err(|e| SetupError::InvalidFilter(e.to_string()))
    }

    /// Initialize the logger with the configured settings.
    ///
    /// The returned guard flushes buffered JSON lines when dropped.
    pub fn init(self) -> Result<Option<WorkerGuard>, SetupError> {
        let filter = self.env_filter()?;

        if !self.json_enabled {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init()
                .map_err(|_| SetupError::SubscriberAlreadySet)?;
            return Ok(None);
        }

        LogTracer::init().map_err(|_| SetupError::LogTracerAlreadyInitialized)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());

        let layer = match self.hostname {
            Some(hostname) => {
                JsonLogLayer::with_hostname(self.application, self.version, hostname, non_blocking)
            }
            None => JsonLogLayer::new(self.application, self.version, non_blocking),
        }
        .redact(self.sensitive);

        let subscriber = Registry::default()
            .with(filter)
            .with(StorageLayer)
            .with(layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|_| SetupError::SubscriberAlreadySet)?;

        Ok(Some(guard))
    }
}
