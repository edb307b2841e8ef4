//! Statement totals, monthly net and savings tips

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{CategorizedTransaction, YearMonth};

/// Savings rate (percent of income) the tips measure against
pub const SAVINGS_TARGET_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

/// Total for one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    /// Signed sum of the category's amounts
    pub total: Decimal,
    pub count: usize,
}

/// Net movement for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyNet {
    pub month: YearMonth,
    pub net: Decimal,
}

/// Aggregate view of a categorized statement
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatementSummary {
    /// Sum of positive amounts
    pub income: Decimal,
    /// Absolute sum of negative amounts
    pub expenses: Decimal,
    pub net: Decimal,
    /// `(income - expenses) / income` in percent, one decimal; `None` without
    /// income or when the ratio is out of range
    pub savings_rate: Option<Decimal>,
    /// Chronological
    pub monthly: Vec<MonthlyNet>,
    /// In order of each category's first appearance
    pub categories: Vec<CategoryTotal>,
}

impl StatementSummary {
    pub fn from_transactions(transactions: &[CategorizedTransaction]) -> Self {
        let mut summary = Self::default();
        let mut monthly: BTreeMap<YearMonth, Decimal> = BTreeMap::new();

        for tx in transactions {
            if tx.amount > Decimal::ZERO {
                summary.income = summary.income.saturating_add(tx.amount);
            } else {
                summary.expenses = summary.expenses.saturating_sub(tx.amount);
            }

            let month = monthly.entry(YearMonth::from_date(tx.date)).or_default();
            *month = month.saturating_add(tx.amount);

            match summary
                .categories
                .iter_mut()
                .find(|c| c.category == tx.category)
            {
                Some(total) => {
                    total.total = total.total.saturating_add(tx.amount);
                    total.count += 1;
                }
                None => summary.categories.push(CategoryTotal {
                    category: tx.category.clone(),
                    total: tx.amount,
                    count: 1,
                }),
            }
        }

        summary.net = summary.income.saturating_sub(summary.expenses);
        summary.savings_rate = summary
            .net
            .checked_div(summary.income)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|rate| rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero));
        summary.monthly = monthly
            .into_iter()
            .map(|(month, net)| MonthlyNet { month, net })
            .collect();

        summary
    }

    /// Category with the most negative total, if any category lost money
    pub fn largest_expense_category(&self) -> Option<&CategoryTotal> {
        self.categories
            .iter()
            .filter(|c| c.total < Decimal::ZERO)
            .min_by(|a, b| a.total.cmp(&b.total))
    }

    /// Short, plain-language advice derived from the totals
    pub fn tips(&self) -> Vec<String> {
        let mut tips = Vec::new();

        match self.savings_rate {
            Some(rate) if rate >= SAVINGS_TARGET_PERCENT => tips.push(format!(
                "Your savings rate is {:.1}%, at or above the {}% target.",
                rate, SAVINGS_TARGET_PERCENT
            )),
            Some(rate) => tips.push(format!(
                "Your savings rate is {:.1}%. Try to save {}% of your income.",
                rate, SAVINGS_TARGET_PERCENT
            )),
            None if self.income.is_zero() => {
                tips.push("No income in this statement, so there is no savings rate.".into())
            }
            None => {}
        }

        if let Some(largest) = self.largest_expense_category() {
            tips.push(format!(
                "Your largest expense category is {} ({:.2}); review it first.",
                largest.category,
                largest.total.abs()
            ));
        }

        tips
    }
}
