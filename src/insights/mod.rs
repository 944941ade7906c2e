//! Insight engine
//!
//! Pure functions over transaction lists: category aggregation, spending
//! change alerts, budget comparison and balance projection. No I/O and
//! no hidden state; identical input yields identical output.

use crate::error::EngineError;
use crate::models::{
    ComparisonPeriod, FinancialInsight, InsightType, Period, Priority, SpendingPattern,
    Transaction, Trend,
};
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

pub mod budget;
pub use budget::{generate_budget_recommendations, recommended_share};

/// Spending change (percent) that triggers an alert
pub const ALERT_CHANGE_THRESHOLD: f64 = 20.0;
/// Spending change (percent) that makes an alert high priority
pub const HIGH_PRIORITY_CHANGE: f64 = 50.0;
/// Share of spending (percent) that makes a category worth flagging
pub const TOP_CATEGORY_THRESHOLD: f64 = 30.0;
/// Per-category change (percent) beyond which a trend is up/down
pub const TREND_TOLERANCE: f64 = 5.0;
pub const DEFAULT_MONTHS_AHEAD: u32 = 3;

/// Reject records the engine cannot reason about
pub fn validate_transactions(transactions: &[Transaction]) -> Result<()> {
    for (index, tx) in transactions.iter().enumerate() {
        if tx.id.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "Transaction at index {} has no id",
                index
            )));
        }
        if !tx.amount.is_finite() {
            return Err(EngineError::Validation(format!(
                "Transaction {} has a non-finite amount",
                tx.id
            )));
        }
        if tx.category.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "Transaction {} has no category",
                tx.id
            )));
        }
    }
    Ok(())
}

/// Sum of absolute debit amounts
pub fn total_spending(transactions: &[Transaction]) -> f64 {
    transactions
        .iter()
        .filter(|tx| tx.is_debit())
        .map(|tx| tx.amount.abs())
        .sum()
}

/// Debit totals per category, in first-seen order
fn category_totals(transactions: &[Transaction]) -> Vec<(String, f64)> {
    let mut totals: Vec<(String, f64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in transactions.iter().filter(|tx| tx.is_debit()) {
        match index.get(tx.category.as_str()) {
            Some(&i) => totals[i].1 += tx.amount.abs(),
            None => {
                index.insert(tx.category.as_str(), totals.len());
                totals.push((tx.category.clone(), tx.amount.abs()));
            }
        }
    }

    totals
}

/// Debit spending per category, largest first.
///
/// Ties keep first-seen category order. Returns an empty list when there
/// is no debit spending. `period` labels the window only; every trend is
/// `stable` until [`compare_with_previous`] is applied.
pub fn analyze_spending_patterns(
    transactions: &[Transaction],
    period: Period,
) -> Vec<SpendingPattern> {
    let totals = category_totals(transactions);
    let total: f64 = totals.iter().map(|(_, amount)| amount).sum();

    if total <= 0.0 {
        debug!(%period, "No debit spending to analyze");
        return Vec::new();
    }

    let mut patterns: Vec<SpendingPattern> = totals
        .into_iter()
        .map(|(category, amount)| SpendingPattern {
            category,
            amount,
            percentage: amount / total * 100.0,
            trend: Trend::Stable,
            comparison_period: None,
        })
        .collect();

    patterns.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(Ordering::Equal));

    debug!(%period, categories = patterns.len(), total, "Analyzed spending patterns");
    patterns
}

/// Attach previous-window figures and an up/down/stable trend per category.
/// A category with no previous spending counts as up by 100%.
pub fn compare_with_previous(
    patterns: &[SpendingPattern],
    previous_transactions: &[Transaction],
) -> Vec<SpendingPattern> {
    let previous: HashMap<String, f64> =
        category_totals(previous_transactions).into_iter().collect();

    patterns
        .iter()
        .map(|pattern| {
            let prior = previous.get(&pattern.category).copied().unwrap_or(0.0);
            let change = if prior > 0.0 {
                (pattern.amount - prior) * 100.0 / prior
            } else {
                100.0
            };
            let trend = if change > TREND_TOLERANCE {
                Trend::Up
            } else if change < -TREND_TOLERANCE {
                Trend::Down
            } else {
                Trend::Stable
            };

            SpendingPattern {
                trend,
                comparison_period: Some(ComparisonPeriod {
                    previous: prior,
                    change,
                }),
                ..pattern.clone()
            }
        })
        .collect()
}

/// Spending-change alert and top-category insight.
///
/// The two rules are independent. With zero previous spending there is
/// no baseline, so no change alert is raised (rather than an infinite one).
pub fn generate_insights(
    current_transactions: &[Transaction],
    previous_transactions: &[Transaction],
) -> Vec<FinancialInsight> {
    let mut insights = Vec::new();
    let created_at = latest_timestamp(current_transactions)
        .or_else(|| latest_timestamp(previous_transactions))
        .unwrap_or_default();

    let current_spending = total_spending(current_transactions);
    let previous_spending = total_spending(previous_transactions);

    if previous_spending > 0.0 {
        let change = (current_spending - previous_spending) * 100.0 / previous_spending;

        if change.abs() > ALERT_CHANGE_THRESHOLD {
            let (title, direction) = if change > 0.0 {
                ("Increased Spending Detected", "increased")
            } else {
                ("Decreased Spending", "decreased")
            };
            let description = format!(
                "Your spending {} by {:.1}% compared to last month.",
                direction,
                change.abs()
            );
            let priority = if change.abs() > HIGH_PRIORITY_CHANGE {
                Priority::High
            } else {
                Priority::Medium
            };

            debug!(change, %priority, "Spending change alert");

            insights.push(FinancialInsight {
                id: insight_id(InsightType::Alert, title, &description),
                insight_type: InsightType::Alert,
                title: title.to_string(),
                description,
                priority,
                actionable: true,
                related_data: Some(json!({
                    "change": change,
                    "currentSpending": current_spending,
                    "previousSpending": previous_spending,
                })),
                created_at,
            });
        }
    }

    let patterns = analyze_spending_patterns(current_transactions, Period::Month);
    if let Some(top) = patterns.first().filter(|p| p.percentage > TOP_CATEGORY_THRESHOLD) {
        let title = format!("High {} Spending", top.category);
        let description = format!(
            "{} accounts for {:.1}% of your spending this month.",
            top.category, top.percentage
        );

        debug!(category = %top.category, percentage = top.percentage, "Top category insight");

        insights.push(FinancialInsight {
            id: insight_id(InsightType::Spending, &title, &description),
            insight_type: InsightType::Spending,
            title,
            description,
            priority: Priority::Medium,
            actionable: true,
            related_data: serde_json::to_value(top).ok(),
            created_at,
        });
    }

    insights
}

/// `current_balance + (credits - debits) * months_ahead` over the given window
pub fn predict_future_balance(
    current_balance: f64,
    transactions: &[Transaction],
    months_ahead: u32,
) -> f64 {
    let credits: f64 = transactions
        .iter()
        .filter(|tx| tx.is_credit())
        .map(|tx| tx.amount)
        .sum();
    let net_change = credits - total_spending(transactions);

    current_balance + net_change * f64::from(months_ahead)
}

fn latest_timestamp(transactions: &[Transaction]) -> Option<DateTime<Utc>> {
    transactions.iter().map(|tx| tx.timestamp).max()
}

/// Content-derived id so repeated calls agree
fn insight_id(kind: InsightType, title: &str, description: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{:?}", kind).as_bytes());
    hasher.update(title.as_bytes());
    hasher.update(description.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("insight-{}", &digest[..16])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{TransactionStatus, TransactionType};
    use chrono::TimeZone;

    pub(crate) fn tx(
        id: &str,
        tx_type: TransactionType,
        amount: f64,
        category: &str,
    ) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: "acc-1".to_string(),
            tx_type,
            amount,
            category: category.to_string(),
            description: format!("{} purchase", category),
            merchant_name: None,
            status: TransactionStatus::Completed,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    pub(crate) fn debit(id: &str, amount: f64, category: &str) -> Transaction {
        tx(id, TransactionType::Debit, amount, category)
    }

    fn credit(id: &str, amount: f64) -> Transaction {
        tx(id, TransactionType::Credit, amount, "income")
    }

    #[test]
    fn test_patterns_sorted_and_sum_to_hundred() {
        let txs = vec![
            debit("1", -350.0, "dining"),
            debit("2", -500.0, "shopping"),
            debit("3", -200.0, "transportation"),
            debit("4", -50.0, "dining"),
            credit("5", 3000.0),
        ];

        let patterns = analyze_spending_patterns(&txs, Period::Month);
        let categories: Vec<&str> = patterns.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, vec!["shopping", "dining", "transportation"]);

        assert!(patterns.windows(2).all(|w| w[0].amount >= w[1].amount));
        let sum: f64 = patterns.iter().map(|p| p.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-6);
        assert!(patterns.iter().all(|p| p.trend == Trend::Stable));
        assert_eq!(patterns[1].amount, 400.0);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let txs = vec![
            debit("1", 100.0, "utilities"),
            debit("2", 100.0, "groceries"),
            debit("3", 100.0, "travel"),
        ];

        let patterns = analyze_spending_patterns(&txs, Period::Week);
        let categories: Vec<&str> = patterns.iter().map(|p| p.category.as_str()).collect();
        assert_eq!(categories, vec!["utilities", "groceries", "travel"]);
    }

    #[test]
    fn test_no_spending_yields_no_patterns() {
        let txs = vec![credit("1", 100.0), tx("2", TransactionType::Transfer, -40.0, "savings")];
        assert!(analyze_spending_patterns(&txs, Period::Month).is_empty());
        assert!(analyze_spending_patterns(&[], Period::Month).is_empty());
    }

    #[test]
    fn test_alert_threshold_is_strict() {
        let previous = vec![debit("p", 1000.0, "misc")];

        let at_threshold = generate_insights(&[debit("c", 1200.0, "misc")], &previous);
        assert!(at_threshold.iter().all(|i| i.insight_type != InsightType::Alert));

        let above = generate_insights(&[debit("c", 1201.0, "misc")], &previous);
        let alert = above
            .iter()
            .find(|i| i.insight_type == InsightType::Alert)
            .unwrap();
        assert_eq!(alert.priority, Priority::Medium);
        assert_eq!(alert.title, "Increased Spending Detected");
    }

    #[test]
    fn test_large_drop_is_high_priority() {
        let previous = vec![debit("p", 1000.0, "a"), debit("q", 1000.0, "b")];
        let current = vec![debit("c", 400.0, "a"), debit("d", 400.0, "b"), debit("e", 100.0, "c")];

        let insights = generate_insights(&current, &previous);
        let alert = &insights[0];
        assert_eq!(alert.insight_type, InsightType::Alert);
        assert_eq!(alert.priority, Priority::High);
        assert_eq!(
            alert.description,
            "Your spending decreased by 55.0% compared to last month."
        );
        // a/b each hold 44.4%, so the top-category rule fires too
        assert_eq!(insights.len(), 2);
    }

    #[test]
    fn test_top_category_insight() {
        let current = vec![debit("1", 700.0, "dining"), debit("2", 300.0, "travel")];
        let insights = generate_insights(&current, &[]);

        // empty previous window: no baseline, so no change alert
        assert!(insights.iter().all(|i| i.insight_type != InsightType::Alert));
        assert_eq!(insights.len(), 1);
        assert_eq!(insights[0].insight_type, InsightType::Spending);
        assert_eq!(insights[0].title, "High dining Spending");
        assert_eq!(
            insights[0].description,
            "dining accounts for 70.0% of your spending this month."
        );
    }

    #[test]
    fn test_balanced_spending_emits_nothing() {
        let current: Vec<Transaction> = (0..4)
            .map(|i| debit(&i.to_string(), 100.0, &format!("cat{}", i)))
            .collect();
        assert!(generate_insights(&current, &current).is_empty());
    }

    #[test]
    fn test_insights_are_idempotent() {
        let previous = vec![debit("p", 100.0, "dining")];
        let current = vec![debit("c", 900.0, "dining")];

        let first = generate_insights(&current, &previous);
        let second = generate_insights(&current, &previous);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_ne!(first[0].id, first[1].id);
    }

    #[test]
    fn test_predict_future_balance() {
        let txs = vec![credit("1", 5000.0), debit("2", -3000.0, "rent"), debit("3", 500.0, "food")];
        assert_eq!(predict_future_balance(1000.0, &txs, DEFAULT_MONTHS_AHEAD), 5500.0);
        assert_eq!(predict_future_balance(1000.0, &[], DEFAULT_MONTHS_AHEAD), 1000.0);
        assert_eq!(predict_future_balance(1000.0, &txs, 0), 1000.0);
    }

    #[test]
    fn test_compare_with_previous() {
        let current = analyze_spending_patterns(
            &[debit("1", 300.0, "dining"), debit("2", 100.0, "travel"), debit("3", 50.0, "pets")],
            Period::Month,
        );
        let previous = vec![debit("p1", 200.0, "dining"), debit("p2", 102.0, "travel")];

        let compared = compare_with_previous(&current, &previous);
        assert_eq!(compared[0].trend, Trend::Up);
        assert_eq!(compared[0].comparison_period.unwrap().change, 50.0);
        assert_eq!(compared[1].trend, Trend::Stable);
        assert_eq!(compared[2].trend, Trend::Up);
        assert_eq!(compared[2].comparison_period.unwrap().previous, 0.0);
        // the input keeps its default trend
        assert!(current.iter().all(|p| p.trend == Trend::Stable));
    }

    #[test]
    fn test_validate_transactions() {
        assert!(validate_transactions(&[debit("1", 10.0, "food")]).is_ok());
        assert!(validate_transactions(&[debit("", 10.0, "food")]).is_err());
        assert!(validate_transactions(&[debit("1", f64::NAN, "food")]).is_err());
        assert!(validate_transactions(&[debit("1", 10.0, "  ")]).is_err());
    }
}
