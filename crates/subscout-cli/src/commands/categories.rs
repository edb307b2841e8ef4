//! Category table command implementations

use std::path::Path;

use anyhow::Result;
use subscout_core::config::{default_config_path, Settings};

use super::load_settings;

pub fn cmd_categories(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    print!("{}", render_categories(&settings));
    Ok(())
}

pub fn cmd_categories_path() -> Result<()> {
    match default_config_path() {
        Some(path) => {
            println!("{}", path.display());
            if !path.exists() {
                println!("  (not present; built-in categories are used)");
            }
        }
        None => println!("No per-user data directory on this platform."),
    }
    Ok(())
}

pub fn render_categories(settings: &Settings) -> String {
    let mut out = String::new();

    out.push('\n');
    out.push_str(&format!("🏷️  Categories (from {})\n", settings.source));
    out.push_str("   First matching category wins, top to bottom.\n");
    out.push_str("   ─────────────────────────────\n");

    if settings.table.is_empty() {
        out.push_str("   (empty table: everything falls back to income/uncategorized)\n");
    }
    for (i, category) in settings.table.categories().iter().enumerate() {
        out.push_str(&format!(
            "   {:>2}. {:16} {}\n",
            i + 1,
            category.name,
            category.keywords.join(", ")
        ));
    }

    let detection = &settings.detection;
    out.push_str("\n🔍 Detection\n");
    out.push_str(&format!("   Amount tolerance: {}\n", detection.amount_tolerance));
    out.push_str(&format!("   Min occurrences:  {}\n", detection.min_occurrences));
    out.push_str(&format!("   Periodicity:      {}\n", detection.periodicity));
    out.push_str(&format!(
        "   Providers:        {}\n",
        settings.provider_category.as_deref().unwrap_or("(all expenses)")
    ));

    out
}
