//! Logging initialization built on tracing-subscriber.
//!
//! Console output goes through a compact fmt layer; file output (when
//! enabled) uses a non-blocking daily-rotating appender whose worker guard
//! must stay alive for the process lifetime.

use std::sync::Mutex;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

use crate::infrastructure::config::LoggingConfig;

// Keeps the non-blocking file writer alive after init returns.
static LOG_GUARDS: Lazy<Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Initialize the logging system with default configuration.
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Initialize logging with custom configuration.
///
/// `RUST_LOG` takes precedence over the configured level and module
/// filters, so noisy dependencies can be re-enabled ad hoc:
///
/// ```bash
/// RUST_LOG="debug,reqwest=debug,hyper=debug" course-harvester --listings
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let mut directives = config.level.clone();
            for (module, level) in &config.module_filters {
                directives.push_str(&format!(",{module}={level}"));
            }
            EnvFilter::try_new(directives).context("invalid logging configuration")?
        }
    };

    let console_layer = config
        .console_output
        .then(|| fmt::layer().with_target(true).compact());

    let file_layer = if config.file_output {
        std::fs::create_dir_all(&config.log_dir).with_context(|| {
            format!("failed to create log directory {}", config.log_dir.display())
        })?;
        let appender = tracing_appender::rolling::daily(&config.log_dir, "course-harvester.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        LOG_GUARDS.lock().unwrap().push(guard);
        Some(fmt::layer().with_writer(writer).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer.map(|l| l.boxed()))
        .with(file_layer.map(|l| l.boxed()))
        .try_init()
        .context("logging already initialized")?;

    Ok(())
}
