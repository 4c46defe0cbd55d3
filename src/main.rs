use anyhow::Result;
use clap::Parser;
use tracing::info;

mod cli;
mod config;
mod dates;
mod decode;
mod error;
mod extract;
mod models;
mod pipeline;
mod storage;
#[cfg(test)]
mod testutil;
mod walker;

use cli::{Cli, Commands};
use config::Config;
use pipeline::ImportSummary;
use storage::Storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "stclock=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let file_appender = tracing_appender::rolling::never(".", "stclock.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env()),
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env()),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run { overrides } => {
            let config = Config::resolve(overrides)?;
            config.validate()?;

            let summary = pipeline::run_import(&config).await?;
            print_summary(&summary);

            // Cleanup runs only after every worker has reported in.
            let mut storage = Storage::connect(&config.database_path, &config.collection).await?;
            let deleted = storage.delete_invalid_records().await?;
            println!("Cleanup removed {} invalid record(s)", deleted);
        }

        Commands::Import { overrides } => {
            let config = Config::resolve(overrides)?;
            config.validate()?;

            let summary = pipeline::run_import(&config).await?;
            print_summary(&summary);
        }

        Commands::Cleanup { overrides } => {
            let config = Config::resolve(overrides)?;

            let mut storage = Storage::connect(&config.database_path, &config.collection).await?;
            let deleted = storage.delete_invalid_records().await?;
            let remaining = storage.count_records().await?;
            info!(deleted, remaining, "cleanup finished");
            println!(
                "Cleanup removed {} invalid record(s), {} remaining",
                deleted, remaining
            );
        }
    }

    Ok(())
}

fn print_summary(summary: &ImportSummary) {
    println!(
        "Imported {} record(s) with {} worker(s): {} file(s) read, {} missing, {} failed; \
         {} line(s) excluded, {} malformed, {} insert failure(s)",
        summary.inserted,
        summary.workers,
        summary.walk.files_read,
        summary.walk.files_missing,
        summary.walk.files_failed,
        summary.walk.lines_excluded,
        summary.walk.lines_failed,
        summary.insert_failures,
    );
}
