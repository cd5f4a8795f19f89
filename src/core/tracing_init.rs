use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::LoggingConfig;

/// Output style for the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Console,
}

impl LogFormat {
    /// `console = true` wins over whatever `format` says
    pub fn from_config(config: &LoggingConfig) -> Self {
        if config.console || config.format.eq_ignore_ascii_case("console") {
            LogFormat::Console
        } else {
            LogFormat::Json
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match LogFormat::from_config(config) {
        LogFormat::Console => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init(),
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
