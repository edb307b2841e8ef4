//! Categorize command implementation

use std::path::Path;

use anyhow::Result;
use subscout_core::report::transactions_from_records;
use subscout_core::{categorize_all, export_transactions, CategorizedTransaction};

use super::{load_records, load_settings, parse_output, report_dropped, truncate, OutputFormat};

pub fn cmd_categorize(config: Option<&Path>, file: &Path, layout: &str, output: &str) -> Result<()> {
    let output = parse_output(output)?;
    let settings = load_settings(config)?;
    let (records, skipped) = load_records(file, layout)?;

    let (transactions, dropped) = transactions_from_records(&records);
    report_dropped(skipped + dropped);
    let transactions = categorize_all(&transactions, &settings.table);

    match output {
        OutputFormat::Export(format) => {
            export_transactions(std::io::stdout().lock(), &transactions, format)?;
        }
        OutputFormat::Table => {
            if transactions.is_empty() {
                println!("No transactions found in {}.", file.display());
                return Ok(());
            }
            print!("{}", render_transactions_table(&transactions));
        }
    }

    Ok(())
}

/// Plain-text table of categorized transactions
pub fn render_transactions_table(transactions: &[CategorizedTransaction]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("🏷️  Categorized Transactions\n");
    out.push_str("   ─────────────────────────────────────────────────────────────────────\n");

    for tx in transactions {
        out.push_str(&format!(
            "   {} │ {:36} │ {:>10.2} │ {}\n",
            tx.date,
            truncate(&tx.description, 36),
            tx.amount,
            tx.category
        ));
    }

    out.push_str(&format!("\n   {} transactions\n", transactions.len()));
    out
}
