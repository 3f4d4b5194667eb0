//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `mail_posture` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use mail_posture::bulk::{load_domains, run_bulk, write_csv_file, BulkSummary};
use mail_posture::config::{Command, Opt};
use mail_posture::initialization::{init_evaluator, init_logger_with, LiveEvaluator};
use mail_posture::output::{render_json, render_text};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let evaluator = init_evaluator(opt.resolver, opt.evaluator_config())
        .context("Failed to initialize evaluator")?;

    match opt.command {
        Command::Check { domain, json } => check(&evaluator, &domain, json).await,
        Command::Bulk {
            file,
            output,
            concurrency,
        } => {
            let domains = load_domains(&file)?;
            if domains.is_empty() {
                eprintln!("No domains found in {}", file.display());
                process::exit(1);
            }
            println!("Checking {} domains...\n", domains.len());

            let entries = run_bulk(&evaluator, domains, concurrency).await;
            write_csv_file(&output, &entries)?;

            println!("{}", BulkSummary::from_entries(&entries));
            println!("Results saved to: {}", output.display());
            Ok(())
        }
        Command::Serve { bind, port } => mail_posture::server::serve(bind, port, evaluator).await,
    }
}

async fn check(evaluator: &LiveEvaluator, domain: &str, json: bool) -> Result<()> {
    match evaluator.evaluate(domain).await {
        Ok(report) => {
            if json {
                println!("{}", render_json(&report).context("Failed to serialize report")?);
            } else {
                print!("{}", render_text(&report));
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("mail_posture error: {e}");
            process::exit(1);
        }
    }
}
