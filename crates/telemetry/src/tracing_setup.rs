//! Log subscriber setup.
//!
//! The service logs in a compact human format on a terminal and as one JSON
//! object per line when shipped to a collector. Voucher codes and phone
//! numbers appear as structured fields, so the JSON format keeps them
//! searchable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when no `GARDENS_LOG` or `RUST_LOG` directive is set.
pub const DEFAULT_FILTER: &str = "info,tower_http=debug";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// `json`, `1` and `true` select JSON; anything else is pretty.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" | "1" | "true" => Self::Json,
            _ => Self::Pretty,
        }
    }
}

/// Log filter and format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// `EnvFilter` directives, e.g. `info,store=debug`
    pub filter: String,
    pub format: LogFormat,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl TracingConfig {
    /// Reads `GARDENS_LOG` (falling back to `RUST_LOG`) and `LOG_FORMAT`
    /// (falling back to `LOG_JSON`) through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let filter = lookup("GARDENS_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|f| !f.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = lookup("LOG_FORMAT")
            .or_else(|| lookup("LOG_JSON"))
            .map(|v| LogFormat::parse(&v))
            .unwrap_or_default();
        Self { filter, format }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// The configured filter, or the default when its directives are invalid.
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Installs the global subscriber. Returns false if one was already set.
pub fn init_tracing(config: &TracingConfig) -> bool {
    let registry = tracing_subscriber::registry().with(config.env_filter());

    let installed = match config.format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()
            .is_ok(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(true))
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(filter = %config.filter, format = ?config.format, "Logging initialized");
    }
    installed
}

/// Installs the global subscriber from the process environment.
pub fn init_tracing_from_env() -> bool {
    init_tracing(&TracingConfig::from_env())
}
