use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod docker;
mod project;

use cli::Cli;

/// Entry point: set up file logging under `~/.inoyb/logs`, parse the
/// command line and dispatch. User-facing output goes to stdout; the
/// operational trail goes to the daily-rolling log file.
#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Keep the non-blocking writer guard alive for the whole run
    let _guard = match config::config_dir() {
        Ok(dir) => {
            let logs_dir = dir.join("logs");
            let file_appender = tracing_appender::rolling::RollingFileAppender::new(
                tracing_appender::rolling::Rotation::DAILY,
                logs_dir,
                "inoyb",
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                // Plain text log files, no ANSI escapes
                .with_ansi(false)
                .with_target(false)
                .with_max_level(tracing::Level::INFO)
                .init();

            Some(guard)
        }
        // No home directory: run without file logging rather than failing
        Err(_) => None,
    };

    info!("inoyb starting");
    cli::run(cli).await;
}
