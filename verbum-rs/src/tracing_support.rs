//! Tracing and logging support.
//!
//! The engine itself only emits `tracing` events: registrations and dispatch
//! at `debug`, rejected union alternatives and subcommand descent at `trace`,
//! shadowed command names at `warn`. Hosts that don't install their own
//! subscriber can use the helpers here.

#[cfg(feature = "tracing")]
pub use tracing::{self, debug, error, info, instrument, trace, warn};

#[cfg(feature = "tracing")]
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter, Layer,
    Registry,
};

/// Tracing output format.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TracingFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,

    /// One line per event.
    Compact,

    /// JSON objects, one per line.
    Json,
}

/// Tracing configuration.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TracingConfig {
    /// `EnvFilter` directives such as `"info,verbum=trace"`.
    ///
    /// If None, uses RUST_LOG environment variable or defaults to "info".
    pub filter: Option<String>,

    pub format: TracingFormat,

    /// Include timestamps in output.
    pub timestamps: bool,

    /// Include target module names in output.
    pub target: bool,

    /// Include thread IDs in output.
    pub thread_ids: bool,
}

#[cfg(feature = "tracing")]
impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: None,
            format: TracingFormat::Pretty,
            timestamps: true,
            target: true,
            thread_ids: false,
        }
    }
}

#[cfg(feature = "tracing")]
impl TracingConfig {
    fn env_filter(&self) -> EnvFilter {
        match &self.filter {
            Some(directives) => EnvFilter::new(directives),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        }
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_target(self.target)
            .with_thread_ids(self.thread_ids);

        match (self.format, self.timestamps) {
            (TracingFormat::Pretty, true) => layer.pretty().boxed(),
            (TracingFormat::Pretty, false) => layer.pretty().without_time().boxed(),
            (TracingFormat::Compact, true) => layer.compact().boxed(),
            (TracingFormat::Compact, false) => layer.compact().without_time().boxed(),
            (TracingFormat::Json, true) => layer.json().boxed(),
            (TracingFormat::Json, false) => layer.json().without_time().boxed(),
        }
    }
}

/// Install a global subscriber with default settings.
///
/// Uses RUST_LOG environment variable for level filtering.
/// Defaults to "info" level if RUST_LOG is not set.
///
/// # Example
///
/// ```no_run
/// verbum::init_subscriber().expect("a subscriber is already installed");
/// ```
///
/// # Environment Variables
///
/// - `RUST_LOG=debug` - Log registrations and dispatch
/// - `RUST_LOG=verbum=trace` - Also log conversion attempts
#[cfg(feature = "tracing")]
pub fn init_subscriber() -> Result<(), TryInitError> {
    init_subscriber_with_config(TracingConfig::default())
}

/// Install a global subscriber configured by `config`. Fails if one is
/// already installed.
///
/// # Example
///
/// ```no_run
/// use verbum::{init_subscriber_with_config, TracingConfig, TracingFormat};
///
/// let config = TracingConfig {
///     format: TracingFormat::Json,
///     timestamps: false,
///     ..Default::default()
/// };
/// init_subscriber_with_config(config).unwrap();
/// ```
#[cfg(feature = "tracing")]
pub fn init_subscriber_with_config(config: TracingConfig) -> Result<(), TryInitError> {
    // The fmt layer is typed against the bare registry, so it goes on first.
    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(config.env_filter())
        .try_init()
}

// Fallback when tracing feature is disabled
#[cfg(not(feature = "tracing"))]
pub fn init_subscriber() -> Result<(), std::convert::Infallible> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "tracing")]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.format, TracingFormat::Pretty);
        assert!(config.timestamps);
        assert!(config.target);
        assert!(!config.thread_ids);
        assert!(config.filter.is_none());
    }

    #[test]
    #[cfg(feature = "tracing")]
    fn test_config_from_json() {
        let config: TracingConfig =
            serde_json::from_str(r#"{"format": "json", "thread-ids": true, "filter": "verbum=trace"}"#)
                .unwrap();
        assert_eq!(config.format, TracingFormat::Json);
        assert!(config.thread_ids);
        assert!(config.timestamps);
        assert_eq!(config.filter.as_deref(), Some("verbum=trace"));
    }
}
