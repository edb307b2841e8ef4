//! Subscout CLI - Bank statement categorizer and subscription finder
//!
//! Usage:
//!   subscout categorize --file statement.csv     Category per transaction
//!   subscout detect --file statement.csv         Recurring charges
//!   subscout summary --file statement.csv        Totals and savings tips
//!   subscout categories                          Effective category table

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr so csv/json output can be piped
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Categorize { input, output } => {
            commands::cmd_categorize(config, &input.file, &input.layout, &output)
        }
        Commands::Detect {
            input,
            tolerance,
            lenient,
            policy,
            providers_only,
            output,
        } => {
            let options = commands::DetectOptions {
                tolerance,
                lenient,
                policy,
                providers_only,
            };
            commands::cmd_detect(config, &input.file, &input.layout, &options, &output)
        }
        Commands::Summary { input } => commands::cmd_summary(config, &input.file, &input.layout),
        Commands::Categories { path } => {
            if path {
                commands::cmd_categories_path()
            } else {
                commands::cmd_categories(config)
            }
        }
    }
}
