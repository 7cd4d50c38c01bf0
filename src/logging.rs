//! Console logging setup
//!
//! Diagnostics go to stderr so that stdout stays free for the JSON profile output.

use serde::Deserialize;
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Logging configuration options, read from the `[logging]` table of `config.toml`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "anchored_profile=debug")
    pub level_filter: String,
    /// Whether to include timestamps in console output
    pub console_timestamps: bool,
    /// Whether to colour console output
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level_filter: "info,anchored_profile=info".to_string(),
            console_timestamps: true,
            ansi: true,
        }
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `level_filter`.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.level_filter))?;

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_level(true)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    let console_layer = if config.console_timestamps {
        console_layer
            .with_timer(ChronoUtc::new("%Y-%m-%d %H:%M:%S%.3f UTC".to_string()))
            .with_filter(filter)
            .boxed()
    } else {
        console_layer.without_time().with_filter(filter).boxed()
    };

    tracing_subscriber::registry().with(console_layer).try_init()?;

    tracing::info!(
        level_filter = %config.level_filter,
        timestamps = config.console_timestamps,
        "🖥️ Console logging initialized"
    );
    Ok(())
}
