mod best_effort;
mod cli;
mod config;
mod error;
mod event_log;
mod models;
mod paths;
mod services;
mod system;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::AppError;
use crate::event_log::StatusLog;
use crate::models::SetupExitCode;
use crate::services::UpgradeOrchestrator;
use crate::system::WindowsSystem;
use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = Config::load(cli.overrides()).context("Failed to load configuration")?;
    tracing::info!("Starting inplace_upgrade with config: {:?}", config);

    let mut log = StatusLog::open(&config.status_log).with_context(|| {
        format!("Failed to open status log {}", config.status_log.display())
    })?;

    if let Some(path) = log.path() {
        tracing::info!("Status log: {}", path.display());
    }

    let system = WindowsSystem::new();
    let outcome = UpgradeOrchestrator::new(&system, &config).run(&mut log).await;
    tracing::debug!(
        "Run {} recorded {} status events",
        log.run_id(),
        log.events().len()
    );

    match outcome {
        Ok(report) => {
            println!("{}", report.summary_line());
            Ok(report.exit_code())
        }
        Err(err) => {
            println!("{}", aborted_line(&err));
            Ok(SetupExitCode::GeneralError.code())
        }
    }
}

fn aborted_line(err: &AppError) -> String {
    format!(
        "Upgrade aborted with code {}: {}. Fix the problem and run again.",
        SetupExitCode::GeneralError,
        err
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inplace_upgrade=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let code = run(cli).await?;
    std::process::exit(code);
}
