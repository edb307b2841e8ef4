//! Subscout Core Library
//!
//! Bank statement analysis for the subscout tool:
//! - Description normalization (the grouping key for everything else)
//! - Keyword categorization over an ordered category table
//! - Recurring-charge detection with selectable policies
//! - Statement import for explicit column layouts
//! - Totals, savings rate and tips
//! - CSV/JSON export of both reporting views

pub mod categorize;
pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod normalize;
pub mod report;
pub mod summary;

pub use categorize::{categorize, categorize_all, Category, CategoryTable, INCOME, UNCATEGORIZED};
pub use config::{load_config, parse_config, ConfigSource, Settings};
pub use detect::{
    detect, DetectionConfig, MinOccurrencePolicy, PeriodicityPolicy, RecurrenceDetector,
};
pub use error::{Error, Result};
pub use export::{export_recurring, export_transactions, ExportFormat};
pub use import::{parse_records_json, parse_statement, ParsedStatement, StatementFormat};
pub use models::{
    CategorizedTransaction, Periodicity, RecurrenceReport, StatementRecord, Transaction, YearMonth,
};
pub use normalize::normalize;
pub use report::{analyze, Analysis, ReportAssembler};
pub use summary::{CategoryTotal, MonthlyNet, StatementSummary};
