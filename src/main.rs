//! feed-herald: pick one unpublished article, summarize it, post it.
//! Meant to be run by an external scheduler, one run at a time.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use feed_herald::{logging, AppConfig, RunOutcome, Runner};

#[derive(Debug, Parser)]
#[command(name = "feed-herald", version, about)]
struct Cli {
    /// TOML config file (default: $HERALD_CONFIG_PATH, then config/herald.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Build the post but do not send it or record it
    #[arg(long)]
    dry_run: bool,

    /// Fixed seed for random selection
    #[arg(long)]
    seed: Option<u64>,

    /// JSON log lines instead of compact text
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.log_json);

    let mut cfg = match AppConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "configuration error");
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = cli.seed {
        cfg.select.seed = Some(seed);
    }

    let mut runner = match Runner::from_config(&cfg, cli.dry_run) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "configuration error");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runner.run_once().await;
    if let RunOutcome::DryRun { message, .. } = &outcome {
        println!("{message}");
    }
    tracing::info!(outcome = outcome_name(&outcome), link = ?outcome.link(), "run finished");
    ExitCode::from(outcome.exit_code())
}

fn outcome_name(outcome: &RunOutcome) -> &'static str {
    match outcome {
        RunOutcome::Misconfigured { .. } => "misconfigured",
        RunOutcome::NothingNew => "nothing_new",
        RunOutcome::EnrichmentAborted { .. } => "enrichment_aborted",
        RunOutcome::DeliveryFailed { .. } => "delivery_failed",
        RunOutcome::Published { .. } => "published",
        RunOutcome::DryRun { .. } => "dry_run",
    }
}
