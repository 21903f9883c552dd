use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use dotenv::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use job_index::cli::{execute, log_failure, LogFormat};
use job_index::{Cli, Dependencies, IndexingError, Settings};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// First Ctrl-C cancels at the next batch boundary; a second one exits
/// immediately.
async fn watch_interrupts(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_err() {
        return;
    }
    warn!("Received interrupt, stopping after the current batch");
    cancel.cancel();

    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Received second interrupt, exiting");
        std::process::exit(130);
    }
}

async fn run(cli: &Cli) -> Result<(), IndexingError> {
    let settings = cli.apply_overrides(Settings::from_env()?);
    let deps = Dependencies::new(&settings).await?;
    tokio::spawn(watch_interrupts(deps.cancel.clone()));

    // Logs go to stderr; stdout carries only the JSON result.
    let mut output = Vec::new();
    execute(&cli.command, &deps, &mut output).await?;
    std::io::stdout().write_all(&output)?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!(command = ?cli.command, "Starting job index");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_failure(&e);
            ExitCode::FAILURE
        }
    }
}
