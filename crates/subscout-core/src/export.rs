//! Export of categorized transactions and recurrence reports
//!
//! Supports:
//! - CSV with a header row
//! - Pretty-printed JSON arrays

use serde::Serialize;
use std::io::Write;

use crate::error::Result;
use crate::models::{CategorizedTransaction, RecurrenceReport};

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Write categorized transactions
pub fn export_transactions<W: Write>(
    writer: W,
    transactions: &[CategorizedTransaction],
    format: ExportFormat,
) -> Result<()> {
    write_rows(writer, transactions, format)
}

/// Write recurrence reports
pub fn export_recurring<W: Write>(
    writer: W,
    reports: &[RecurrenceReport],
    format: ExportFormat,
) -> Result<()> {
    write_rows(writer, reports, format)
}

fn write_rows<W: Write, T: Serialize>(mut writer: W, rows: &[T], format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(writer);
            for row in rows {
                wtr.serialize(row)?;
            }
            wtr.flush()?;
        }
        ExportFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
