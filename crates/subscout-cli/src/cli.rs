//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Subscout - Find the subscriptions hiding in your bank statement
#[derive(Parser)]
#[command(name = "subscout")]
#[command(about = "Categorize bank statements and detect recurring charges", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Category table and detector settings (TOML)
    ///
    /// Defaults to the per-user override if present, else the built-in table.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Statement input shared by the analysis commands
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// Statement file to read
    #[arg(short, long)]
    pub file: PathBuf,

    /// Statement layout: spanish, simple, json
    #[arg(short, long, default_value = "spanish")]
    pub layout: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assign a category to every transaction
    Categorize {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: table, csv, json
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Detect recurring charges (subscriptions)
    Detect {
        #[command(flatten)]
        input: InputArgs,

        /// Largest amount standard deviation within one subscription
        #[arg(short, long)]
        tolerance: Option<String>,

        /// Report subscriptions seen only twice (low confidence)
        #[arg(long)]
        lenient: bool,

        /// Periodicity rule: gap-median, month-coverage
        #[arg(short, long)]
        policy: Option<String>,

        /// Only consider descriptions matching the provider category keywords
        #[arg(long)]
        providers_only: bool,

        /// Output format: table, csv, json
        #[arg(short, long, default_value = "table")]
        output: String,
    },

    /// Show totals, savings rate, monthly net and tips
    Summary {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show the effective category table
    Categories {
        /// Print where the per-user override file is looked up
        #[arg(long)]
        path: bool,
    },
}
