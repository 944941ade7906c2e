//! Entity / pattern library
//!
//! Static tables that map text fragments to intents, slot values and
//! category colors. Everything here is immutable once built; runtime
//! additions go through an explicit [`PhraseTable`] handed to the matcher.

use crate::models::{EntityMap, IntentType};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

/// Spending categories the matcher recognizes in free text
pub const CATEGORY_TERMS: &[&str] = &[
    "dining",
    "shopping",
    "transportation",
    "utilities",
    "groceries",
    "entertainment",
    "healthcare",
    "travel",
];

pub const ACCOUNT_TYPES: &[&str] = &["checking", "savings", "credit"];

pub const PERIOD_WORDS: &[&str] = &["week", "month", "quarter", "year"];

/// Fallback period when a spending query names none
pub const DEFAULT_PERIOD: &str = "month";

lazy_static! {
    pub static ref ACCOUNT_TYPE_RE: Regex = Regex::new(r"\b(checking|savings|credit)\b").unwrap();
    pub static ref CATEGORY_RE: Regex = Regex::new(
        r"\b(dining|shopping|transportation|utilities|groceries|entertainment|healthcare|travel)\b"
    )
    .unwrap();
    pub static ref PERIOD_RE: Regex = Regex::new(r"\b(week|month|quarter|year)\b").unwrap();
    pub static ref PAYMENT_RE: Regex = Regex::new(r"\b(payments?|paid|pay)\b").unwrap();
    pub static ref HISTORY_RE: Regex = Regex::new(r"\b(transactions?|history|recent)\b").unwrap();

    // Prose-reply slot extractors (case-insensitive, applied to the raw message)
    pub static ref AMOUNT_RE: Regex = Regex::new(r"\$?(\d+(?:,\d{3})*(?:\.\d{2})?)").unwrap();
    pub static ref LOOSE_PERIOD_RE: Regex =
        Regex::new(r"(?i)\b(week|month|quarter|year|today|yesterday)\b").unwrap();
}

/// First capture group of `re` in `text`
pub fn capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

//
// ================= Phrase table =================
//

/// Canned classification for a known phrase
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseEntry {
    pub intent: IntentType,
    pub entities: EntityMap,
    pub response: String,
}

impl PhraseEntry {
    pub fn new(intent: IntentType, entities: Value, response: impl Into<String>) -> Self {
        let entities = match entities {
            Value::Object(map) => map,
            _ => EntityMap::new(),
        };

        Self {
            intent,
            entities,
            response: response.into(),
        }
    }
}

/// Ordered phrase registry. Iteration order is registration order.
#[derive(Debug, Clone)]
pub struct PhraseTable {
    entries: Vec<(String, PhraseEntry)>,
}

impl Default for PhraseTable {
    fn default() -> Self {
        Self::canonical()
    }
}

impl PhraseTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a phrase. Re-registering a phrase replaces it in place.
    pub fn register(&mut self, pattern: &str, entry: PhraseEntry) {
        let key = pattern.trim().to_lowercase();

        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = entry;
        } else {
            self.entries.push((key, entry));
        }
    }

    pub fn exact(&self, normalized: &str) -> Option<&PhraseEntry> {
        self.entries
            .iter()
            .find(|(k, _)| k == normalized)
            .map(|(_, e)| e)
    }

    /// First registered phrase contained in `normalized`
    pub fn find_substring(&self, normalized: &str) -> Option<&PhraseEntry> {
        self.entries
            .iter()
            .find(|(k, _)| normalized.contains(k.as_str()))
            .map(|(_, e)| e)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn phrases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// The built-in banking phrase set
    pub fn canonical() -> Self {
        use IntentType::*;

        let mut table = Self::empty();
        let mut add = |pattern: &str, intent: IntentType, entities: Value, response: &str| {
            table.register(pattern, PhraseEntry::new(intent, entities, response));
        };

        // Balance checking
        add("balance", CheckBalance, json!({}), "I'll check your account balances for you.");
        add(
            "checking balance",
            CheckBalance,
            json!({ "accountType": "checking" }),
            "I'll check your checking account balance.",
        );
        add(
            "savings balance",
            CheckBalance,
            json!({ "accountType": "savings" }),
            "I'll check your savings account balance.",
        );
        add(
            "credit balance",
            CheckBalance,
            json!({ "accountType": "credit" }),
            "I'll check your credit card balance.",
        );

        // Transaction history
        add(
            "transactions",
            ViewTransactions,
            json!({ "limit": 10 }),
            "I'll show you your recent transactions.",
        );
        add(
            "recent transactions",
            ViewTransactions,
            json!({ "limit": 10 }),
            "Here are your recent transactions.",
        );
        add(
            "last payments",
            ViewTransactions,
            json!({ "limit": 5 }),
            "I'll show you your last payments.",
        );
        add(
            "payment history",
            ViewTransactions,
            json!({ "limit": 10 }),
            "I'll show you your payment history.",
        );

        // Spending analysis
        add(
            "spending",
            SpendingAnalysis,
            json!({ "period": "month" }),
            "Let me analyze your spending patterns for this month.",
        );
        add(
            "spending this month",
            SpendingAnalysis,
            json!({ "period": "month" }),
            "I'll analyze your spending for this month.",
        );
        add(
            "analyze spending",
            SpendingAnalysis,
            json!({ "period": "month" }),
            "Let me analyze your spending patterns.",
        );
        add(
            "spending on dining",
            SpendingAnalysis,
            json!({ "period": "month", "category": "dining" }),
            "Let me analyze your dining spending for this month.",
        );

        // Transfers
        add(
            "transfer",
            TransferMoney,
            json!({ "amount": 500, "fromAccount": "checking", "toAccount": "savings" }),
            "I can help you transfer money between accounts.",
        );
        add(
            "transfer 500 to savings",
            TransferMoney,
            json!({ "amount": 500, "fromAccount": "checking", "toAccount": "savings" }),
            "I'll transfer $500 from checking to savings.",
        );
        add(
            "transfer 1000 to checking",
            TransferMoney,
            json!({ "amount": 1000, "fromAccount": "savings", "toAccount": "checking" }),
            "I'll transfer $1000 from savings to checking.",
        );

        // Loan eligibility
        add(
            "loan",
            LoanEligibility,
            json!({ "loanType": "personal" }),
            "Let me check your loan eligibility.",
        );
        add(
            "home loan",
            LoanEligibility,
            json!({ "loanType": "home" }),
            "I'll check your eligibility for a home loan.",
        );
        add(
            "car loan",
            LoanEligibility,
            json!({ "loanType": "auto" }),
            "I'll check your eligibility for a car loan.",
        );
        add(
            "eligible for",
            LoanEligibility,
            json!({ "loanType": "home" }),
            "Let me check your eligibility.",
        );

        // Greetings
        add(
            "hello",
            GeneralInquiry,
            json!({}),
            "Hello! I'm your AI banking assistant. How can I help you today?",
        );
        add("hi", GeneralInquiry, json!({}), "Hi! What can I help you with?");
        add(
            "help",
            GeneralInquiry,
            json!({}),
            "I can help you check balances, analyze spending, transfer money, and check loan eligibility. What would you like to do?",
        );

        table
    }
}

//
// ================= Category colors =================
//

pub const CATEGORY_COLORS: &[(&str, &str)] = &[
    ("food", "#ef4444"),
    ("dining", "#f97316"),
    ("shopping", "#f59e0b"),
    ("transportation", "#10b981"),
    ("utilities", "#3b82f6"),
    ("entertainment", "#8b5cf6"),
    ("healthcare", "#ec4899"),
    ("savings", "#14b8a6"),
    ("other", "#6b7280"),
];

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#ef4444", "#f97316", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#ec4899", "#14b8a6",
];

/// Line color for savings trend charts
pub const TREND_COLOR: &str = "#10b981";

pub fn lookup_category_color(category: &str) -> Option<&'static str> {
    let key = category.to_lowercase();
    CATEGORY_COLORS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, color)| *color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_order() {
        let table = PhraseTable::canonical();
        let phrases: Vec<&str> = table.phrases().collect();

        assert_eq!(phrases.first(), Some(&"balance"));
        assert_eq!(phrases.last(), Some(&"help"));
        assert_eq!(table.len(), 22);
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut table = PhraseTable::canonical();
        table.register(
            "Balance",
            PhraseEntry::new(
                IntentType::CheckBalance,
                json!({ "accountType": "savings" }),
                "custom",
            ),
        );

        assert_eq!(table.len(), 22);
        assert_eq!(table.phrases().next(), Some("balance"));
        assert_eq!(table.exact("balance").unwrap().response, "custom");
    }

    #[test]
    fn test_substring_lookup_uses_registration_order() {
        let table = PhraseTable::canonical();
        // "loan" is registered before "home loan"
        let entry = table.find_substring("i want a home loan please").unwrap();
        assert_eq!(entry.entities.get("loanType"), Some(&json!("personal")));
    }

    #[test]
    fn test_slot_extractors() {
        assert_eq!(capture(&ACCOUNT_TYPE_RE, "my savings account"), Some("savings"));
        assert_eq!(capture(&PERIOD_RE, "this quarter please"), Some("quarter"));
        assert!(PAYMENT_RE.is_match("last payments"));
        assert!(!PAYMENT_RE.is_match("paypal"));
        assert_eq!(capture(&AMOUNT_RE, "send $1,250.50 now"), Some("1,250.50"));
    }

    #[test]
    fn test_category_color_lookup_is_case_insensitive() {
        assert_eq!(lookup_category_color("Dining"), Some("#f97316"));
        assert_eq!(lookup_category_color("pets"), None);
    }
}
