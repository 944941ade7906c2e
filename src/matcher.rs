//! Rule-based matcher
//!
//! Deterministic classifier over the phrase table and slot extractors.
//! Multi-condition rules are checked before the generic phrase lookups:
//! 1. category + spending term
//! 2. spending term
//! 3. payment query (not an analysis)
//! 4. transaction / history query (not an analysis)
//! 5. balance + account type
//! 6. exact phrase
//! 7. phrase substring (registration order)
//! 8. general inquiry

use crate::models::{EntityMap, IntentType};
use crate::patterns::{
    capture, PhraseEntry, PhraseTable, ACCOUNT_TYPE_RE, CATEGORY_RE, DEFAULT_PERIOD, HISTORY_RE,
    PAYMENT_RE, PERIOD_RE,
};
use serde_json::json;

const REPHRASE_RESPONSE: &str =
    "I understand you need help. Could you please rephrase your question?";

/// Rule-based matcher over an explicit phrase registry
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    table: PhraseTable,
}

impl RuleMatcher {
    pub fn new(table: PhraseTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &PhraseTable {
        &self.table
    }

    /// Classify a raw message
    pub fn match_message(&self, message: &str) -> PhraseEntry {
        let normalized = message.trim().to_lowercase();
        let text = normalized.as_str();

        let account_type = capture(&ACCOUNT_TYPE_RE, text);
        let category = capture(&CATEGORY_RE, text);
        let mentions_spending = text.contains("spend");
        let is_analysis = text.contains("analyze") || text.contains("spending");

        if mentions_spending {
            let period = capture(&PERIOD_RE, text).unwrap_or(DEFAULT_PERIOD);

            if let Some(category) = category {
                return PhraseEntry::new(
                    IntentType::SpendingAnalysis,
                    json!({ "period": period, "category": category }),
                    format!(
                        "Let me analyze your {} spending for the {} period.",
                        category, period
                    ),
                );
            }

            return PhraseEntry::new(
                IntentType::SpendingAnalysis,
                json!({ "period": period }),
                format!("Let me analyze your spending patterns for the {} period.", period),
            );
        }

        if PAYMENT_RE.is_match(text) && !is_analysis {
            let limit = if text.contains("last") { 3 } else { 5 };
            let mut entities = EntityMap::new();
            if let Some(account) = account_type {
                entities.insert("accountType".into(), json!(account));
            }
            entities.insert("limit".into(), json!(limit));
            entities.insert("paymentsOnly".into(), json!(true));

            let response = match account_type {
                Some(account) => format!(
                    "I'll show you recent payments from your {} account.",
                    account
                ),
                None => "I'll show you your recent payments.".to_string(),
            };

            return PhraseEntry {
                intent: IntentType::ViewTransactions,
                entities,
                response,
            };
        }

        if HISTORY_RE.is_match(text) && !is_analysis {
            let mut entities = EntityMap::new();
            if let Some(account) = account_type {
                entities.insert("accountType".into(), json!(account));
            }
            entities.insert("limit".into(), json!(10));

            let response = match account_type {
                Some(account) => format!(
                    "I'll show you recent transactions for your {} account.",
                    account
                ),
                None => "I'll show you your recent transactions.".to_string(),
            };

            return PhraseEntry {
                intent: IntentType::ViewTransactions,
                entities,
                response,
            };
        }

        if text.contains("balance") {
            if let Some(account) = account_type {
                return PhraseEntry::new(
                    IntentType::CheckBalance,
                    json!({ "accountType": account }),
                    format!("I'll check your {} account balance.", account),
                );
            }
        }

        if let Some(entry) = self.table.exact(text) {
            return entry.clone();
        }

        if let Some(entry) = self.table.find_substring(text) {
            return entry.clone();
        }

        PhraseEntry::new(IntentType::GeneralInquiry, json!({}), REPHRASE_RESPONSE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn matcher() -> RuleMatcher {
        RuleMatcher::default()
    }

    fn entities(value: Value) -> EntityMap {
        match value {
            Value::Object(map) => map,
            _ => EntityMap::new(),
        }
    }

    #[test]
    fn test_category_spending_beats_generic_spending() {
        let result = matcher().match_message("spending on dining");
        assert_eq!(result.intent, IntentType::SpendingAnalysis);
        assert_eq!(
            result.entities,
            entities(json!({ "period": "month", "category": "dining" }))
        );
    }

    #[test]
    fn test_spending_picks_up_period() {
        let result = matcher().match_message("  How much did I SPEND this quarter? ");
        assert_eq!(result.intent, IntentType::SpendingAnalysis);
        assert_eq!(result.entities, entities(json!({ "period": "quarter" })));
        assert!(result.response.contains("quarter"));
    }

    #[test]
    fn test_last_payments_limits_to_three() {
        let result = matcher().match_message("last payments");
        assert_eq!(result.intent, IntentType::ViewTransactions);
        assert_eq!(
            result.entities,
            entities(json!({ "limit": 3, "paymentsOnly": true }))
        );
    }

    #[test]
    fn test_payments_with_account_type() {
        let result = matcher().match_message("what did I pay from checking");
        assert_eq!(
            result.entities,
            entities(json!({ "accountType": "checking", "limit": 5, "paymentsOnly": true }))
        );
        assert_eq!(
            result.response,
            "I'll show you recent payments from your checking account."
        );
    }

    #[test]
    fn test_history_query() {
        let result = matcher().match_message("show my savings history");
        assert_eq!(result.intent, IntentType::ViewTransactions);
        assert_eq!(
            result.entities,
            entities(json!({ "accountType": "savings", "limit": 10 }))
        );
    }

    #[test]
    fn test_analysis_wording_skips_payment_and_history_rules() {
        for message in ["analyze my payments", "analyze recent history"] {
            let result = matcher().match_message(message);
            assert_eq!(result.intent, IntentType::GeneralInquiry, "{}", message);
            assert!(result.entities.is_empty(), "{}", message);
        }

        let result = matcher().match_message("pay my bill");
        assert_eq!(result.intent, IntentType::ViewTransactions);
        assert_eq!(
            result.entities,
            entities(json!({ "limit": 5, "paymentsOnly": true }))
        );
    }

    #[test]
    fn test_balance_with_account_type() {
        let result = matcher().match_message("checking balance");
        assert_eq!(result.intent, IntentType::CheckBalance);
        assert_eq!(result.entities, entities(json!({ "accountType": "checking" })));
    }

    #[test]
    fn test_exact_phrase_lookup() {
        let result = matcher().match_message("Transfer 500 to savings");
        assert_eq!(result.intent, IntentType::TransferMoney);
        assert_eq!(result.response, "I'll transfer $500 from checking to savings.");
    }

    #[test]
    fn test_substring_phrase_lookup() {
        let result = matcher().match_message("what is my balance");
        assert_eq!(result.intent, IntentType::CheckBalance);
        assert!(result.entities.is_empty());

        let result = matcher().match_message("am I eligible for a mortgage");
        assert_eq!(result.intent, IntentType::LoanEligibility);
    }

    #[test]
    fn test_greeting_is_general() {
        let result = matcher().match_message("hello");
        assert_eq!(result.intent, IntentType::GeneralInquiry);
        assert!(result.response.starts_with("Hello!"));
    }

    #[test]
    fn test_no_match_asks_to_rephrase() {
        let result = matcher().match_message("zzz");
        assert_eq!(result.intent, IntentType::GeneralInquiry);
        assert!(result.entities.is_empty());
        assert_eq!(result.response, REPHRASE_RESPONSE);
    }

    #[test]
    fn test_custom_registry() {
        let mut table = PhraseTable::empty();
        table.register(
            "rainy day fund",
            PhraseEntry::new(IntentType::SavingsGoal, json!({}), "Let's plan that fund."),
        );

        let result = RuleMatcher::new(table).match_message("start a rainy day fund");
        assert_eq!(result.intent, IntentType::SavingsGoal);
    }
}
