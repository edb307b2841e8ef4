//! Domain models for subscout

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// A statement row as handed over by an ingestion collaborator.
///
/// Every field is optional so that rows which leaked through ingestion with
/// a missing date or amount can still be passed in; they are dropped rather
/// than rejected (see [`Transaction::from_record`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    /// Negative = expense, positive = income
    pub amount: Option<Decimal>,
}

impl StatementRecord {
    pub fn new(date: NaiveDate, description: &str, amount: Decimal) -> Self {
        Self {
            date: Some(date),
            description: Some(description.to_string()),
            amount: Some(amount),
        }
    }
}

/// A complete transaction with its derived grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: NaiveDate,
    pub raw_description: String,
    /// Negative = expense, positive = income
    pub amount: Decimal,
    /// Lower-cased, prefix/punctuation-stripped description
    pub normalized_description: String,
}

impl Transaction {
    pub fn new(date: NaiveDate, raw_description: &str, amount: Decimal) -> Self {
        Self {
            date,
            raw_description: raw_description.to_string(),
            amount,
            normalized_description: normalize(raw_description),
        }
    }

    /// Build a transaction from an ingestion record.
    ///
    /// Returns `None` when the date or the amount is missing. A missing
    /// description is treated as empty text.
    pub fn from_record(record: &StatementRecord) -> Option<Self> {
        let date = record.date?;
        let amount = record.amount?;
        Some(Self::new(
            date,
            record.description.as_deref().unwrap_or_default(),
            amount,
        ))
    }

    pub fn is_expense(&self) -> bool {
        self.amount < Decimal::ZERO
    }

    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }
}

/// One row of the per-transaction categorization output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorizedTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: Decimal,
    pub category: String,
}

/// Billing cadence assigned to a recurrence cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Periodicity {
    Monthly,
    Quarterly,
    Annual,
    /// Only two occurrences seen; emitted under the lenient policy
    IrregularWeak,
    /// Not recurring; never appears in a report
    Rejected,
}

impl Periodicity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annual => "annual",
            Self::IrregularWeak => "irregular-weak",
            Self::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for Periodicity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "annual" | "yearly" => Ok(Self::Annual),
            "irregular-weak" | "irregular_weak" => Ok(Self::IrregularWeak),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown periodicity: {}", s)),
        }
    }
}

impl std::fmt::Display for Periodicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected recurring charge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrenceReport {
    /// Normalized description shared by every member of the cluster
    pub description: String,
    /// Mean of member amounts, rounded to 2 decimals
    pub representative_amount: Decimal,
    pub periodicity: Periodicity,
    pub occurrence_count: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    /// Set for `irregular-weak` verdicts drawn from a single gap
    pub low_confidence: bool,
    /// Median day gap between consecutive charges (absent for month-coverage verdicts)
    pub median_gap_days: Option<f64>,
}

/// A calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_from_record_requires_date_and_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let complete = StatementRecord::new(date, "NETFLIX.COM", Decimal::new(-1299, 2));
        let tx = Transaction::from_record(&complete).unwrap();
        assert_eq!(tx.normalized_description, "netflix com");
        assert!(tx.is_expense());

        let no_date = StatementRecord {
            date: None,
            ..complete.clone()
        };
        assert!(Transaction::from_record(&no_date).is_none());

        let no_amount = StatementRecord {
            amount: None,
            ..complete.clone()
        };
        assert!(Transaction::from_record(&no_amount).is_none());
    }

    #[test]
    fn test_from_record_missing_description_is_empty() {
        let record = StatementRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            description: None,
            amount: Some(Decimal::new(500, 2)),
        };
        let tx = Transaction::from_record(&record).unwrap();
        assert_eq!(tx.raw_description, "");
        assert_eq!(tx.normalized_description, "");
    }

    #[test]
    fn test_periodicity_round_trips_through_str() {
        for p in [
            Periodicity::Monthly,
            Periodicity::Quarterly,
            Periodicity::Annual,
            Periodicity::IrregularWeak,
            Periodicity::Rejected,
        ] {
            assert_eq!(Periodicity::from_str(p.as_str()).unwrap(), p);
        }
        assert_eq!(Periodicity::from_str("yearly").unwrap(), Periodicity::Annual);
        assert!(Periodicity::from_str("weekly").is_err());
    }

    #[test]
    fn test_periodicity_serializes_kebab_case() {
        let json = serde_json::to_string(&Periodicity::IrregularWeak).unwrap();
        assert_eq!(json, "\"irregular-weak\"");
    }

    #[test]
    fn test_year_month_display_and_order() {
        let jan = YearMonth::from_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let dec = YearMonth::from_date(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(jan.to_string(), "2024-01");
        assert!(dec < jan);
    }
}
