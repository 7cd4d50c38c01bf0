use thiserror::Error;

/// Fatal configuration problems, reported before any bar is processed
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error(
        "render_lookback {render_lookback} must be below max_lookback {max_lookback} minus safety_margin {safety_margin}"
    )]
    RenderWindow {
        render_lookback: u64,
        max_lookback: u64,
        safety_margin: u64,
    },
    #[error("Sub-bar interval {sub_bar_secs}s must be shorter than bar interval {bar_secs}s")]
    SubBarInterval { sub_bar_secs: u64, bar_secs: u64 },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
