//! Category table and detector settings
//!
//! ## Configuration Resolution
//!
//! Settings are loaded with a two-layer resolution:
//! 1. An explicit path, or the per-user override
//!    (~/.local/share/subscout/config/categories.toml)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! A file that is missing falls through to the next layer. A file that exists
//! but is malformed is an error: silently ignoring a user's table would
//! categorize with rules they never wrote.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::categorize::{Category, CategoryTable};
use crate::detect::DetectionConfig;
use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../../config/categories.toml");

/// Where the effective settings came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Embedded,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Embedded => write!(f, "built-in defaults"),
        }
    }
}

/// Effective category table and detector settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub table: CategoryTable,
    pub detection: DetectionConfig,
    /// Category whose keywords pre-filter detection, if configured
    pub provider_category: Option<String>,
    pub source: ConfigSource,
}

impl Settings {
    /// Built-in table and defaults
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Restrict detection to the keywords of `category`
    pub fn restrict_to_provider(&mut self, category: &str) -> Result<()> {
        let keywords = provider_keywords(&self.table, category)?;
        self.detection = self.detection.clone().with_provider_keywords(&keywords);
        self.provider_category = Some(category.to_string());
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("subscout").join("config").join("categories.toml"))
}

/// Load settings (explicit path or per-user override first, then default)
pub fn load_config(path: Option<&Path>) -> Result<Settings> {
    let candidate = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    match candidate {
        Some(p) if p.exists() => {
            let content = fs::read_to_string(&p).map_err(|e| {
                Error::Config(format!("Failed to read {}: {}", p.display(), e))
            })?;
            let mut settings = parse_config(&content)
                .map_err(|e| Error::Config(format!("{}: {}", p.display(), config_message(e))))?;
            info!("Loaded {} categories from {}", settings.table.len(), p.display());
            settings.source = ConfigSource::File(p);
            Ok(settings)
        }
        Some(p) => {
            if path.is_some() {
                warn!("Config {} not found, using built-in categories", p.display());
            } else {
                debug!("No override at {}, using built-in categories", p.display());
            }
            Settings::embedded()
        }
        None => Settings::embedded(),
    }
}

/// Message of a config error without its "Configuration error:" prefix
fn config_message(e: Error) -> String {
    match e {
        Error::Config(msg) => msg,
        other => other.to_string(),
    }
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    detection: Option<RawDetection>,
    /// `[[category]]` array of tables keeps declaration order
    #[serde(default, rename = "category")]
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDetection {
    amount_tolerance: Option<f64>,
    min_occurrences: Option<String>,
    periodicity: Option<String>,
    provider_category: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCategory {
    name: String,
    #[serde(default)]
    keywords: Vec<String>,
}

/// Parse settings from TOML content
pub fn parse_config(content: &str) -> Result<Settings> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let categories = raw
        .categories
        .into_iter()
        .map(|c| Category {
            name: c.name,
            keywords: c.keywords,
        })
        .collect();
    let table = CategoryTable::new(categories)?;

    let mut detection = DetectionConfig::default();
    let mut provider_category = None;

    // Apply detection settings
    if let Some(raw) = raw.detection {
        if let Some(tolerance) = raw.amount_tolerance {
            detection.amount_tolerance = parse_tolerance(tolerance)?;
        }
        if let Some(policy) = raw.min_occurrences {
            detection.min_occurrences = policy.parse().map_err(Error::Config)?;
        }
        if let Some(policy) = raw.periodicity {
            detection.periodicity = policy.parse().map_err(Error::Config)?;
        }
        if let Some(category) = raw.provider_category {
            let keywords = provider_keywords(&table, &category)?;
            detection = detection.with_provider_keywords(&keywords);
            provider_category = Some(category);
        }
    }

    Ok(Settings {
        table,
        detection,
        provider_category,
        source: ConfigSource::Embedded,
    })
}

/// Convert a configured tolerance into an exact decimal
pub fn parse_tolerance(value: f64) -> Result<Decimal> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::Config(format!(
            "amount_tolerance must be a non-negative number, got {}",
            value
        )));
    }
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .ok_or_else(|| Error::Config(format!("amount_tolerance out of range: {}", value)))
}

fn provider_keywords(table: &CategoryTable, category: &str) -> Result<Vec<String>> {
    table
        .get(category)
        .map(|c| c.keywords.clone())
        .ok_or_else(|| Error::Config(format!("Unknown provider_category: {}", category)))
}
