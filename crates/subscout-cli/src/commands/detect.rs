//! Detect command implementation

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use subscout_core::config::Settings;
use subscout_core::{analyze, export_recurring, MinOccurrencePolicy, PeriodicityPolicy, RecurrenceReport};

use super::{load_records, load_settings, parse_output, report_dropped, truncate, OutputFormat};

/// Category used by --providers-only when the config names none
pub const DEFAULT_PROVIDER_CATEGORY: &str = "subscriptions";

/// Command-line overrides for the configured detector settings
#[derive(Debug, Clone, Default)]
pub struct DetectOptions {
    pub tolerance: Option<String>,
    pub lenient: bool,
    pub policy: Option<String>,
    pub providers_only: bool,
}

impl DetectOptions {
    /// Apply the overrides on top of the loaded settings
    pub fn apply(&self, settings: &mut Settings) -> Result<()> {
        if let Some(ref tolerance) = self.tolerance {
            let value = Decimal::from_str(tolerance.trim())
                .with_context(|| format!("Invalid --tolerance: {}", tolerance))?;
            if value.is_sign_negative() {
                bail!("--tolerance must not be negative (got {})", tolerance);
            }
            settings.detection.amount_tolerance = value;
        }

        if self.lenient {
            settings.detection.min_occurrences = MinOccurrencePolicy::Lenient;
        }

        if let Some(ref policy) = self.policy {
            settings.detection.periodicity = policy
                .parse::<PeriodicityPolicy>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }

        if self.providers_only {
            let category = settings
                .provider_category
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER_CATEGORY.to_string());
            settings
                .restrict_to_provider(&category)
                .with_context(|| format!("--providers-only needs a '{}' category", category))?;
        }

        Ok(())
    }
}

pub fn cmd_detect(
    config: Option<&Path>,
    file: &Path,
    layout: &str,
    options: &DetectOptions,
    output: &str,
) -> Result<()> {
    let output = parse_output(output)?;
    let mut settings = load_settings(config)?;
    options.apply(&mut settings)?;
    let (records, skipped) = load_records(file, layout)?;

    let analysis = analyze(&records, &settings.table, &settings.detection);
    report_dropped(skipped + analysis.dropped);

    match output {
        OutputFormat::Export(format) => {
            export_recurring(std::io::stdout().lock(), &analysis.recurring, format)?;
        }
        OutputFormat::Table => {
            if analysis.recurring.is_empty() {
                println!("No recurring charges found.");
                if settings.detection.min_occurrences == MinOccurrencePolicy::Strict {
                    println!("  Charges seen only twice are skipped; try --lenient");
                }
                return Ok(());
            }
            print!("{}", render_recurring_table(&analysis.recurring));
        }
    }

    Ok(())
}

/// Plain-text table of recurrence reports
pub fn render_recurring_table(reports: &[RecurrenceReport]) -> String {
    let mut out = String::new();
    out.push('\n');
    out.push_str("📋 Recurring Charges\n");
    out.push_str("   ─────────────────────────────────────────────────────────────────────\n");

    for r in reports {
        let marker = if r.low_confidence { "?" } else { " " };
        out.push_str(&format!(
            "   {}{:28} │ {:>9.2} │ {:<14} │ {:>3}x │ {} → {}\n",
            marker,
            truncate(&r.description, 28),
            r.representative_amount,
            r.periodicity.as_str(),
            r.occurrence_count,
            r.first_date,
            r.last_date
        ));
    }

    let total = reports.len();
    let weak = reports.iter().filter(|r| r.low_confidence).count();
    out.push_str(&format!("\n   {} recurring charge(s)", total));
    if weak > 0 {
        out.push_str(&format!(", {} low confidence (?)", weak));
    }
    out.push('\n');
    out
}
