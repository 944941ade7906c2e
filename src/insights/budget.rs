use crate::models::{BudgetRecommendation, SpendingPattern};
use tracing::{debug, warn};

/// Tolerated overspend before a recommendation is raised
pub const OVER_BUDGET_FACTOR: f64 = 1.2;
/// Share of income for categories missing from the table
pub const DEFAULT_SHARE: f64 = 10.0;

const RECOMMENDED_SHARES: &[(&str, f64)] = &[
    ("housing", 30.0),
    ("food", 15.0),
    ("transportation", 15.0),
    ("utilities", 10.0),
    ("entertainment", 10.0),
    ("savings", 20.0),
];

/// Recommended percent of income for a category (case-insensitive)
pub fn recommended_share(category: &str) -> f64 {
    let category = category.to_lowercase();
    RECOMMENDED_SHARES
        .iter()
        .find(|(name, _)| *name == category)
        .map(|(_, share)| *share)
        .unwrap_or(DEFAULT_SHARE)
}

/// Categories spending more than 20% over their share of `income`,
/// in pattern order.
pub fn generate_budget_recommendations(
    patterns: &[SpendingPattern],
    income: f64,
) -> Vec<BudgetRecommendation> {
    if !income.is_finite() || income <= 0.0 {
        warn!(income, "Cannot build budget recommendations without positive income");
        return Vec::new();
    }

    patterns
        .iter()
        .filter_map(|pattern| {
            let share = recommended_share(&pattern.category);
            let recommended_limit = income * share / 100.0;

            if pattern.amount <= recommended_limit * OVER_BUDGET_FACTOR {
                return None;
            }

            let over = (pattern.amount / recommended_limit - 1.0) * 100.0;
            debug!(category = %pattern.category, over, "Category over budget");

            Some(BudgetRecommendation {
                category: pattern.category.clone(),
                current_spending: pattern.amount,
                recommended_limit,
                reasoning: format!(
                    "Your {} spending is {:.0}% above the recommended {:.0}% of income.",
                    pattern.category, over, share
                ),
            })
        })
        .collect()
}
