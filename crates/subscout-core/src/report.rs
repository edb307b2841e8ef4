//! Pipeline from statement records to the two reporting views
//!
//! Records → transactions (normalized) → per-transaction categories, and
//! independently → recurrence reports. Records missing a date or an amount
//! are excluded from both views and only counted.

use tracing::{debug, info};

use crate::categorize::{categorize_all, CategoryTable};
use crate::detect::{DetectionConfig, RecurrenceDetector};
use crate::models::{CategorizedTransaction, RecurrenceReport, StatementRecord, Transaction};

/// Output of one analysis run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// One entry per complete input record, in input order
    pub transactions: Vec<CategorizedTransaction>,
    /// Accepted recurrence clusters, sorted by first charge then description
    pub recurring: Vec<RecurrenceReport>,
    /// Records excluded for a missing date or amount
    pub dropped: usize,
}

/// Assembles categorization and detection output for a statement
#[derive(Debug, Clone)]
pub struct ReportAssembler<'a> {
    table: &'a CategoryTable,
    detector: RecurrenceDetector,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(table: &'a CategoryTable, config: DetectionConfig) -> Self {
        Self {
            table,
            detector: RecurrenceDetector::with_config(config),
        }
    }

    pub fn assemble(&self, records: &[StatementRecord]) -> Analysis {
        let (transactions, dropped) = transactions_from_records(records);

        let analysis = Analysis {
            transactions: categorize_all(&transactions, self.table),
            recurring: self.detector.detect(&transactions),
            dropped,
        };

        info!(
            "Analyzed {} transactions: {} recurring charges, {} records dropped",
            analysis.transactions.len(),
            analysis.recurring.len(),
            analysis.dropped
        );

        analysis
    }
}

/// Categorize and detect in one pass over `records`
pub fn analyze(
    records: &[StatementRecord],
    table: &CategoryTable,
    config: &DetectionConfig,
) -> Analysis {
    ReportAssembler::new(table, config.clone()).assemble(records)
}

/// Complete records as transactions, plus the number of incomplete ones
pub fn transactions_from_records(records: &[StatementRecord]) -> (Vec<Transaction>, usize) {
    let mut transactions = Vec::with_capacity(records.len());
    let mut dropped = 0;

    for (i, record) in records.iter().enumerate() {
        match Transaction::from_record(record) {
            Some(tx) => transactions.push(tx),
            None => {
                debug!("Excluding record {}: missing date or amount", i + 1);
                dropped += 1;
            }
        }
    }

    (transactions, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::{Category, UNCATEGORIZED};
    use crate::models::Periodicity;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn table() -> CategoryTable {
        CategoryTable::new(vec![Category::new("subscriptions", &["netflix"])]).unwrap()
    }

    #[test]
    fn test_analyze_empty() {
        let analysis = analyze(&[], &table(), &DetectionConfig::default());
        assert_eq!(analysis, Analysis::default());
    }

    #[test]
    fn test_incomplete_records_are_dropped_from_both_views() {
        let date = |m| NaiveDate::from_ymd_opt(2024, m, 7).unwrap();
        let mut records: Vec<_> = (1..=3)
            .map(|m| StatementRecord::new(date(m), "CARD PAYMENT AT NETFLIX", Decimal::new(-1299, 2)))
            .collect();
        records.insert(
            1,
            StatementRecord {
                date: None,
                description: Some("CARD PAYMENT AT NETFLIX".into()),
                amount: Some(Decimal::new(-1299, 2)),
            },
        );
        records.push(StatementRecord {
            date: Some(date(4)),
            description: Some("MYSTERY".into()),
            amount: None,
        });
        records.push(StatementRecord::new(date(4), "Kiosk", Decimal::new(-150, 2)));

        let analysis = analyze(&records, &table(), &DetectionConfig::default());

        assert_eq!(analysis.dropped, 2);
        assert_eq!(analysis.transactions.len(), 4);
        assert_eq!(analysis.transactions[0].category, "subscriptions");
        assert_eq!(analysis.transactions[3].category, UNCATEGORIZED);
        assert_eq!(analysis.transactions[3].description, "Kiosk");

        assert_eq!(analysis.recurring.len(), 1);
        assert_eq!(analysis.recurring[0].description, "netflix");
        assert_eq!(analysis.recurring[0].periodicity, Periodicity::Monthly);
        assert_eq!(analysis.recurring[0].occurrence_count, 3);
    }

    #[test]
    fn test_categorizing_without_detection_matches_analysis() {
        let date = |m| NaiveDate::from_ymd_opt(2024, m, 7).unwrap();
        let mut records: Vec<_> = (1..=3)
            .map(|m| StatementRecord::new(date(m), "NETFLIX", Decimal::new(-1299, 2)))
            .collect();
        records.push(StatementRecord {
            date: None,
            description: Some("NETFLIX".into()),
            amount: Some(Decimal::new(-1299, 2)),
        });

        let (transactions, dropped) = transactions_from_records(&records);
        let categorized = categorize_all(&transactions, &table());
        let analysis = analyze(&records, &table(), &DetectionConfig::default());

        assert_eq!(dropped, analysis.dropped);
        assert_eq!(categorized, analysis.transactions);
    }

    #[test]
    fn test_assembler_reuses_config() {
        let table = table();
        let assembler = ReportAssembler::new(&table, DetectionConfig::default());
        let record = StatementRecord::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            "NETFLIX",
            Decimal::new(-1299, 2),
        );

        let first = assembler.assemble(std::slice::from_ref(&record));
        let second = assembler.assemble(&[record]);
        assert_eq!(first, second);
        assert!(first.recurring.is_empty());
    }
}
