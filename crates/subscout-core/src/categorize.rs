//! Keyword categorization
//!
//! A [`CategoryTable`] is an ordered list of categories, each with keyword
//! substrings. Resolution is first-match-wins over the table's declaration
//! order: overlapping keyword lists are expected, and moving a category up
//! the table is how a user gives it priority.

use rust_decimal::Decimal;
use std::collections::HashSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{CategorizedTransaction, Transaction};
use crate::normalize::canonicalize;

/// Fallback for unmatched transactions with a positive amount
pub const INCOME: &str = "income";

/// Fallback for unmatched transactions with a zero or negative amount
pub const UNCATEGORIZED: &str = "uncategorized";

/// A named category and the keywords that select it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    /// Canonical (lower-case, punctuation-free) substrings
    pub keywords: Vec<String>,
}

impl Category {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// True if any keyword is a substring of the normalized description
    pub fn matches(&self, normalized_description: &str) -> bool {
        self.keywords
            .iter()
            .any(|keyword| normalized_description.contains(keyword.as_str()))
    }
}

/// Ordered, immutable category table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTable {
    categories: Vec<Category>,
}

impl CategoryTable {
    /// Validate and canonicalize a table.
    ///
    /// Keywords are canonicalized the same way descriptions are (without
    /// prefix stripping). Empty names, duplicate names, and keywords that
    /// canonicalize to nothing are configuration errors: an empty keyword
    /// would match every description.
    pub fn new(categories: Vec<Category>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut canonical = Vec::with_capacity(categories.len());

        for category in categories {
            let name = category.name.trim().to_string();
            if name.is_empty() {
                return Err(Error::Config("Category name cannot be empty".into()));
            }
            if !seen.insert(name.to_lowercase()) {
                return Err(Error::Config(format!("Duplicate category: {}", name)));
            }

            let mut keywords = Vec::with_capacity(category.keywords.len());
            for raw in &category.keywords {
                let keyword = canonicalize(raw);
                if keyword.is_empty() {
                    return Err(Error::Config(format!(
                        "Category '{}' has an empty keyword ({:?})",
                        name, raw
                    )));
                }
                keywords.push(keyword);
            }

            canonical.push(Category { name, keywords });
        }

        Ok(Self {
            categories: canonical,
        })
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Look up a category by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// First category, in declaration order, with a matching keyword
    pub fn first_match(&self, normalized_description: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.matches(normalized_description))
    }
}

/// Assign exactly one category to a transaction.
///
/// Unmatched descriptions fall back on the sign of the amount: positive is
/// [`INCOME`], zero or negative is [`UNCATEGORIZED`].
pub fn categorize<'a>(
    normalized_description: &str,
    amount: Decimal,
    table: &'a CategoryTable,
) -> &'a str {
    if let Some(category) = table.first_match(normalized_description) {
        return &category.name;
    }

    if amount > Decimal::ZERO {
        INCOME
    } else {
        UNCATEGORIZED
    }
}

/// Categorize every transaction, preserving input order
pub fn categorize_all(
    transactions: &[Transaction],
    table: &CategoryTable,
) -> Vec<CategorizedTransaction> {
    let categorized: Vec<_> = transactions
        .iter()
        .map(|tx| CategorizedTransaction {
            date: tx.date,
            description: tx.raw_description.clone(),
            amount: tx.amount,
            category: categorize(&tx.normalized_description, tx.amount, table).to_string(),
        })
        .collect();

    debug!("Categorized {} transactions", categorized.len());
    categorized
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn table() -> CategoryTable {
        CategoryTable::new(vec![
            Category::new("subscriptions", &["netflix", "spotify", "prime"]),
            Category::new("shopping", &["amazon", "prime"]),
            Category::new("groceries", &["mercadona", "lidl"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let t = table();
        // "amazon prime" matches both subscriptions ("prime") and shopping ("amazon")
        assert_eq!(
            categorize("amazon prime", Decimal::new(-1499, 2), &t),
            "subscriptions"
        );
    }

    #[test]
    fn test_order_sensitivity_ignores_keyword_order_within_category() {
        let a = CategoryTable::new(vec![
            Category::new("streaming", &["zzz", "netflix"]),
            Category::new("entertainment", &["netflix", "cinema"]),
        ])
        .unwrap();
        let b = CategoryTable::new(vec![
            Category::new("entertainment", &["cinema", "netflix"]),
            Category::new("streaming", &["netflix", "zzz"]),
        ])
        .unwrap();

        assert_eq!(categorize("netflix", Decimal::ONE, &a), "streaming");
        assert_eq!(categorize("netflix", Decimal::ONE, &b), "entertainment");
    }

    #[test]
    fn test_fallbacks_follow_amount_sign() {
        let t = table();
        assert_eq!(categorize("acme payroll", Decimal::new(150000, 2), &t), INCOME);
        assert_eq!(categorize("random shop", Decimal::new(-500, 2), &t), UNCATEGORIZED);
        // Zero is treated as an expense
        assert_eq!(categorize("adjustment", Decimal::ZERO, &t), UNCATEGORIZED);
    }

    #[test]
    fn test_keyword_match_beats_amount_fallback() {
        let t = table();
        // A refund from a known merchant keeps its category
        assert_eq!(categorize("lidl", Decimal::new(250, 2), &t), "groceries");
    }

    #[test]
    fn test_never_empty() {
        let t = CategoryTable::new(vec![]).unwrap();
        for (desc, amount) in [("", "0"), ("x", "-1.00"), ("y", "1.00")] {
            let cat = categorize(desc, Decimal::from_str(amount).unwrap(), &t);
            assert!(!cat.is_empty());
        }
    }

    #[test]
    fn test_keywords_are_canonicalized() {
        let t = CategoryTable::new(vec![Category::new("apple", &["Apple.com/Bill"])]).unwrap();
        assert_eq!(t.categories()[0].keywords, vec!["apple com bill"]);
        assert_eq!(categorize("apple com bill 866", Decimal::NEGATIVE_ONE, &t), "apple");
    }

    #[test]
    fn test_rejects_invalid_tables() {
        let empty_name = CategoryTable::new(vec![Category::new("  ", &["x"])]);
        assert!(matches!(empty_name, Err(Error::Config(_))));

        let duplicate = CategoryTable::new(vec![
            Category::new("food", &["a"]),
            Category::new("Food", &["b"]),
        ]);
        assert!(matches!(duplicate, Err(Error::Config(_))));

        let empty_keyword = CategoryTable::new(vec![Category::new("food", &["..."])]);
        assert!(matches!(empty_keyword, Err(Error::Config(_))));
    }

    #[test]
    fn test_categorize_all_preserves_order() {
        let t = table();
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let txs = vec![
            Transaction::new(date, "LIDL 123", Decimal::new(-2000, 2)),
            Transaction::new(date, "Nomina ACME", Decimal::new(200000, 2)),
            Transaction::new(date, "CARD PAYMENT AT Netflix", Decimal::new(-1299, 2)),
        ];

        let out = categorize_all(&txs, &t);
        let cats: Vec<_> = out.iter().map(|c| c.category.as_str()).collect();
        assert_eq!(cats, vec!["groceries", INCOME, "subscriptions"]);
        assert_eq!(out[2].description, "CARD PAYMENT AT Netflix");
    }
}
