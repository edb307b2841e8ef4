//! Shared command utilities
//!
//! This module contains:
//! - `load_settings` - Resolve the category table and detector settings
//! - `load_records` - Read a statement file in the chosen layout
//! - `OutputFormat` - Table or machine-readable output

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use subscout_core::config::{load_config, Settings};
use subscout_core::import::{parse_records_json, parse_statement, StatementFormat};
use subscout_core::{ExportFormat, StatementRecord};
use tracing::warn;

/// How a statement file is laid out
#[derive(Debug, Clone, PartialEq)]
pub enum Layout {
    Delimited(StatementFormat),
    Json,
}

impl std::str::FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("json") {
            return Ok(Self::Json);
        }
        s.parse::<StatementFormat>()
            .map(Self::Delimited)
            .map_err(|_| format!("Unknown layout: {} (use spanish, simple or json)", s))
    }
}

/// Where command results go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Export(ExportFormat),
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("table") {
            return Ok(Self::Table);
        }
        s.parse::<ExportFormat>()
            .map(Self::Export)
            .map_err(|_| format!("Unknown output format: {} (use table, csv or json)", s))
    }
}

pub fn parse_layout(layout: &str) -> Result<Layout> {
    layout.parse().map_err(|e: String| anyhow!(e))
}

pub fn parse_output(output: &str) -> Result<OutputFormat> {
    output.parse().map_err(|e: String| anyhow!(e))
}

/// Resolve settings from --config, the per-user override, or built-in defaults
pub fn load_settings(config: Option<&Path>) -> Result<Settings> {
    load_config(config).context("Failed to load category configuration")
}

/// Read a statement, returning its records and the rows the importer skipped
pub fn load_records(file: &Path, layout: &str) -> Result<(Vec<StatementRecord>, usize)> {
    let layout = parse_layout(layout)?;
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
    );

    match layout {
        Layout::Json => {
            let records = parse_records_json(reader)
                .with_context(|| format!("Failed to read JSON records from {}", file.display()))?;
            Ok((records, 0))
        }
        Layout::Delimited(format) => {
            let parsed = parse_statement(reader, &format)
                .with_context(|| format!("Failed to import {}", file.display()))?;
            Ok((parsed.records, parsed.dropped))
        }
    }
}

/// Log skipped rows so they are visible without polluting stdout
pub fn report_dropped(dropped: usize) {
    if dropped > 0 {
        warn!(
            "Skipped {} row(s) without a usable date or amount",
            dropped
        );
    }
}
