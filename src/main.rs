//! feedtui - a terminal dashboard for stocks, news, sports and social feeds.

use anyhow::Context;
use clap::Parser;
use feedtui::Config;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "feedtui", version, about)]
struct Cli {
    /// Path to the config file.
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Poll every feed at this interval in seconds, overriding the config.
    #[arg(short, long, value_name = "SECS")]
    refresh: Option<u64>,
}

/// Log to a daily file; the terminal belongs to the dashboard.
fn init_logging() -> anyhow::Result<WorkerGuard> {
    let log_dir = feedtui::config::log_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&log_dir, "feedtui.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "feedtui=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer),
        )
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging()?;

    // Load configuration
    let config = Config::load(cli.config).context("loading configuration")?;

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received interrupt");
                shutdown.cancel();
            }
        });
    }

    // Run the application
    feedtui::run(config, cli.refresh.map(Duration::from_secs), shutdown).await?;

    Ok(())
}
