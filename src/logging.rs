//! Log estruturado no console e em arquivo.
//!
//! O nível vem de `RUST_LOG`; sem ele, `info` (ou `debug` com `--verbose`).

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

fn env_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)))
}

/// Instala o subscriber global. O guard precisa viver até o fim do processo
/// para que o arquivo receba as últimas linhas.
pub fn init(config: &LoggingConfig, verbose: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("failed to create log directory {}", config.directory))?;

    let appender = tracing_appender::rolling::never(&config.directory, &config.file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_filter(env_filter(verbose)),
        )
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(env_filter(verbose)),
        )
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(guard)
}
