//! Library lending desk - interactive terminal front end

use std::io;
use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt::writer::BoxMakeWriter, EnvFilter};

use library_lending::{
    clock::SystemClock,
    config::{AppConfig, LoggingConfig},
    repository::Repository,
    services::Services,
    shell::Shell,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Starting library lending desk v{}", env!("CARGO_PKG_VERSION"));

    let repository = Repository::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;

    tracing::info!(mode = ?config.lending.penalty_mode, "Store ready");

    let services = Services::new(
        repository.clone(),
        config.lending.clone(),
        Arc::new(SystemClock),
    );

    let result = {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut shell = Shell::new(&services, stdin.lock(), stdout.lock());
        shell.run().await
    };

    repository.close().await;
    tracing::info!("Store closed");

    result.context("Interactive session failed")?;
    Ok(())
}

/// Logs go to stderr, or to a daily file when a directory is configured,
/// so stdout stays reserved for the menu.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("library_lending={}", logging.level)));

    let (writer, guard) = match &logging.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, "lending.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }

    guard
}
