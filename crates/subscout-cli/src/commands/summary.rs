//! Summary command implementation

use std::path::Path;

use anyhow::Result;
use subscout_core::report::transactions_from_records;
use subscout_core::{categorize_all, StatementSummary};

use super::{load_records, load_settings, report_dropped, truncate};

pub fn cmd_summary(config: Option<&Path>, file: &Path, layout: &str) -> Result<()> {
    let settings = load_settings(config)?;
    let (records, skipped) = load_records(file, layout)?;

    let (transactions, dropped) = transactions_from_records(&records);
    report_dropped(skipped + dropped);
    let transactions = categorize_all(&transactions, &settings.table);

    if transactions.is_empty() {
        println!("No transactions found in {}.", file.display());
        return Ok(());
    }

    let summary = StatementSummary::from_transactions(&transactions);
    print!("{}", render_summary(&summary));

    Ok(())
}

pub fn render_summary(summary: &StatementSummary) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str("💰 Statement Summary\n");
    out.push_str("   ─────────────────────────────\n");
    out.push_str(&format!("   Income:       {:>12.2}\n", summary.income));
    out.push_str(&format!("   Expenses:     {:>12.2}\n", summary.expenses));
    out.push_str(&format!("   Net:          {:>12.2}\n", summary.net));
    match summary.savings_rate {
        Some(rate) => out.push_str(&format!("   Savings rate: {:>11.1}%\n", rate)),
        None => out.push_str("   Savings rate:          n/a\n"),
    }

    out.push_str("\n📅 Net by Month\n");
    for month in &summary.monthly {
        out.push_str(&format!("   {}  {:>12.2}\n", month.month, month.net));
    }

    out.push_str("\n🏷️  By Category\n");
    for category in &summary.categories {
        out.push_str(&format!(
            "   {:20} {:>12.2}  ({} tx)\n",
            truncate(&category.category, 20),
            category.total,
            category.count
        ));
    }

    out.push_str("\n💡 Tips\n");
    for tip in summary.tips() {
        out.push_str(&format!("   - {}\n", tip));
    }

    out
}
