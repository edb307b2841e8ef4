//! Recurring-charge detection
//!
//! Finds subscriptions without any merchant knowledge:
//! 1. Keep expenses only (optionally only provider-keyword matches)
//! 2. Cluster by exact normalized description (amount is not part of the key)
//! 3. Drop clusters with one member or with an amount spread above tolerance
//! 4. Classify the cluster's cadence with the selected periodicity policy
//!
//! Clusters are independent of each other; output is sorted by first
//! charge date so runs are reproducible.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use tracing::{debug, info};

use crate::models::{Periodicity, RecurrenceReport, Transaction, YearMonth};
use crate::normalize::canonicalize;

/// Median-gap bands, inclusive, in days
const PERIODICITY_BANDS: &[(Periodicity, f64, f64)] = &[
    (Periodicity::Monthly, 25.0, 35.0),
    (Periodicity::Quarterly, 85.0, 95.0),
    (Periodicity::Annual, 355.0, 375.0),
];

/// Fewest distinct months a month-coverage verdict may rest on
const MIN_COVERED_MONTHS: usize = 2;

/// What to do with clusters of exactly two charges (a single gap)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MinOccurrencePolicy {
    /// Two charges are not enough; the cluster is dropped
    #[default]
    Strict,
    /// Two charges are reported as `irregular-weak` with `low_confidence`
    Lenient,
}

impl MinOccurrencePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }
}

impl std::str::FromStr for MinOccurrencePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            _ => Err(format!("Unknown minimum-occurrence policy: {}", s)),
        }
    }
}

impl fmt::Display for MinOccurrencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule used to accept a cluster as recurring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodicityPolicy {
    /// Median day gap must fall in the monthly, quarterly or annual band
    #[default]
    GapMedianBand,
    /// Cluster must touch at least (dataset months - 1) distinct calendar
    /// months. Dataset months are the calendar months holding at least one
    /// transaction, not the first-to-last calendar span, so a month with no
    /// activity at all is not required. Tolerates day-of-month drift; always
    /// reports `monthly`.
    MonthCoverageRatio,
}

impl PeriodicityPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GapMedianBand => "gap-median",
            Self::MonthCoverageRatio => "month-coverage",
        }
    }
}

impl std::str::FromStr for PeriodicityPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "gap-median" | "gap-median-band" => Ok(Self::GapMedianBand),
            "month-coverage" | "month-coverage-ratio" => Ok(Self::MonthCoverageRatio),
            _ => Err(format!("Unknown periodicity policy: {}", s)),
        }
    }
}

impl fmt::Display for PeriodicityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Detection configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Largest population standard deviation of member amounts a cluster
    /// may have and still count as one recurring charge
    pub amount_tolerance: Decimal,
    pub min_occurrences: MinOccurrencePolicy,
    pub periodicity: PeriodicityPolicy,
    /// When set, only expenses whose normalized description contains one of
    /// these (canonical) keywords are considered
    pub provider_keywords: Option<Vec<String>>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            amount_tolerance: Decimal::new(200, 2), // 2.00 currency units
            min_occurrences: MinOccurrencePolicy::Strict,
            periodicity: PeriodicityPolicy::GapMedianBand,
            provider_keywords: None,
        }
    }
}

impl DetectionConfig {
    /// Restrict detection to descriptions containing any of `keywords`.
    /// Keywords are canonicalized; empty ones are ignored.
    pub fn with_provider_keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        let canonical = keywords
            .iter()
            .map(|k| canonicalize(k.as_ref()))
            .filter(|k| !k.is_empty())
            .collect();
        self.provider_keywords = Some(canonical);
        self
    }
}

/// Why a cluster produced no report
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Rejection {
    TooFewMembers(usize),
    AmountSpread { stddev: f64 },
    SameDay,
    SingleGap,
    GapOutsideBands { median: f64 },
    MonthCoverage { touched: usize, required: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewMembers(n) => write!(f, "only {} charge(s)", n),
            Self::AmountSpread { stddev } => write!(f, "amount stddev {:.2} above tolerance", stddev),
            Self::SameDay => write!(f, "every charge on the same date"),
            Self::SingleGap => write!(f, "two charges under the strict policy"),
            Self::GapOutsideBands { median } => {
                write!(f, "median gap {:.1} days outside every band", median)
            }
            Self::MonthCoverage { touched, required } => {
                write!(f, "touches {} month(s), needs {}", touched, required)
            }
        }
    }
}

/// Recurring-charge detector
#[derive(Debug, Clone, Default)]
pub struct RecurrenceDetector {
    config: DetectionConfig,
}

impl RecurrenceDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Detect recurring charges.
    ///
    /// `transactions` may be a whole statement: income is ignored here, but
    /// every transaction counts towards the dataset's active months (used by
    /// the month-coverage policy). Empty input yields no reports.
    pub fn detect(&self, transactions: &[Transaction]) -> Vec<RecurrenceReport> {
        if transactions.is_empty() {
            return Vec::new();
        }

        let dataset_months = transactions
            .iter()
            .map(Transaction::month)
            .collect::<BTreeSet<_>>()
            .len();

        let mut clusters: HashMap<&str, Vec<&Transaction>> = HashMap::new();
        for tx in transactions {
            if !tx.is_expense() || !self.is_provider(&tx.normalized_description) {
                continue;
            }
            clusters
                .entry(tx.normalized_description.as_str())
                .or_default()
                .push(tx);
        }

        let cluster_count = clusters.len();
        let mut reports: Vec<RecurrenceReport> = clusters
            .into_iter()
            .filter_map(|(key, members)| {
                match self.evaluate(key, members, dataset_months) {
                    Ok(report) => {
                        debug!(
                            "Recurring: {} @ {} ({}, {} charges)",
                            report.description,
                            report.representative_amount,
                            report.periodicity,
                            report.occurrence_count
                        );
                        Some(report)
                    }
                    Err(reason) => {
                        debug!("Skipping '{}': {}", key, reason);
                        None
                    }
                }
            })
            .collect();

        reports.sort_by(|a, b| {
            a.first_date
                .cmp(&b.first_date)
                .then_with(|| a.description.cmp(&b.description))
        });

        info!(
            "Recurrence detection: {} clusters, {} recurring ({} / {})",
            cluster_count,
            reports.len(),
            self.config.periodicity,
            self.config.min_occurrences
        );

        reports
    }

    fn is_provider(&self, normalized_description: &str) -> bool {
        match &self.config.provider_keywords {
            Some(keywords) => keywords
                .iter()
                .any(|k| normalized_description.contains(k.as_str())),
            None => true,
        }
    }

    /// Apply the acceptance predicate to one cluster
    fn evaluate(
        &self,
        key: &str,
        mut members: Vec<&Transaction>,
        dataset_months: usize,
    ) -> std::result::Result<RecurrenceReport, Rejection> {
        if members.len() < 2 {
            return Err(Rejection::TooFewMembers(members.len()));
        }

        let amounts: Vec<Decimal> = members.iter().map(|t| t.amount).collect();
        if exceeds_tolerance(&amounts, self.config.amount_tolerance) {
            return Err(Rejection::AmountSpread {
                stddev: population_stddev(&amounts),
            });
        }

        members.sort_by_key(|t| t.date);
        let dates: Vec<NaiveDate> = members.iter().map(|t| t.date).collect();
        let (first_date, last_date) = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Err(Rejection::TooFewMembers(0)),
        };
        if first_date == last_date {
            return Err(Rejection::SameDay);
        }

        let gaps = day_gaps(&dates);
        let report = |periodicity: Periodicity, median_gap_days: Option<f64>| RecurrenceReport {
            description: key.to_string(),
            representative_amount: mean_amount(&amounts),
            periodicity,
            occurrence_count: members.len(),
            first_date,
            last_date,
            low_confidence: periodicity == Periodicity::IrregularWeak,
            median_gap_days,
        };

        // A single gap has no stable median; the policy decides
        if members.len() == 2 {
            return match self.config.min_occurrences {
                MinOccurrencePolicy::Strict => Err(Rejection::SingleGap),
                MinOccurrencePolicy::Lenient => {
                    Ok(report(Periodicity::IrregularWeak, Some(median(&gaps))))
                }
            };
        }

        match self.config.periodicity {
            PeriodicityPolicy::GapMedianBand => {
                let median_gap = median(&gaps);
                match classify_median_gap(median_gap) {
                    Periodicity::Rejected => {
                        Err(Rejection::GapOutsideBands { median: median_gap })
                    }
                    periodicity => Ok(report(periodicity, Some(median_gap))),
                }
            }
            PeriodicityPolicy::MonthCoverageRatio => {
                let touched = dates
                    .iter()
                    .map(|d| YearMonth::from_date(*d))
                    .collect::<BTreeSet<_>>()
                    .len();
                let required = dataset_months.saturating_sub(1).max(MIN_COVERED_MONTHS);
                if touched >= required {
                    Ok(report(Periodicity::Monthly, None))
                } else {
                    Err(Rejection::MonthCoverage { touched, required })
                }
            }
        }
    }
}

/// Detect recurring charges with an explicit configuration
pub fn detect(transactions: &[Transaction], config: &DetectionConfig) -> Vec<RecurrenceReport> {
    RecurrenceDetector::with_config(config.clone()).detect(transactions)
}

/// Map a median day gap onto a periodicity band
pub fn classify_median_gap(median_gap: f64) -> Periodicity {
    PERIODICITY_BANDS
        .iter()
        .find(|(_, low, high)| (*low..=*high).contains(&median_gap))
        .map(|(periodicity, _, _)| *periodicity)
        .unwrap_or(Periodicity::Rejected)
}

/// Day counts between consecutive (sorted) dates
fn day_gaps(dates: &[NaiveDate]) -> Vec<i64> {
    dates.windows(2).map(|w| (w[1] - w[0]).num_days()).collect()
}

/// Population variance exceeds `tolerance²`.
///
/// Evaluated as `n·Σd² − (Σd)² > (n·tol)²` over the offsets `d` from the
/// first amount, which stays exact for two-place amounts. A limit too large
/// to represent is never exceeded; a spread too large to represent falls
/// back to the floating-point deviation.
fn exceeds_tolerance(amounts: &[Decimal], tolerance: Decimal) -> bool {
    let n = Decimal::from(amounts.len());
    let limit = match n.checked_mul(tolerance).and_then(|nt| nt.checked_mul(nt)) {
        Some(limit) => limit,
        None => return false,
    };

    match spread_numerator(amounts, n) {
        Some(spread) => spread > limit,
        None => population_stddev(amounts) > tolerance.to_f64().unwrap_or(f64::MAX),
    }
}

/// `n·Σd² − (Σd)²`, or `None` on overflow
fn spread_numerator(amounts: &[Decimal], n: Decimal) -> Option<Decimal> {
    let base = amounts.first().copied().unwrap_or_default();
    let mut sum = Decimal::ZERO;
    let mut sum_sq = Decimal::ZERO;
    for amount in amounts {
        let offset = amount.checked_sub(base)?;
        sum = sum.checked_add(offset)?;
        sum_sq = sum_sq.checked_add(offset.checked_mul(offset)?)?;
    }
    n.checked_mul(sum_sq)?.checked_sub(sum.checked_mul(sum)?)
}

/// Population standard deviation, for diagnostics only
fn population_stddev(amounts: &[Decimal]) -> f64 {
    let values: Vec<f64> = amounts.iter().filter_map(|a| a.to_f64()).collect();
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Mean rounded to cents, halves away from zero
fn mean_amount(amounts: &[Decimal]) -> Decimal {
    let base = match amounts.first() {
        Some(first) => *first,
        None => return Decimal::ZERO,
    };
    let n = Decimal::from(amounts.len());

    let mean = amounts
        .iter()
        .try_fold(Decimal::ZERO, |acc, a| acc.checked_add(a.checked_sub(base)?))
        .and_then(|offset| base.checked_add(offset / n))
        .unwrap_or_else(|| {
            amounts
                .iter()
                .fold(Decimal::ZERO, |acc, a| acc.saturating_add(*a / n))
        });
    mean.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Calculate median of day gaps
fn median(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) as f64 / 2.0
    } else {
        sorted[mid] as f64
    }
}
