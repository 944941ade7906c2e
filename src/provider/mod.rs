//! Completion provider trait and implementations
//!
//! A provider turns a bounded message history plus the candidate action
//! catalog into either prose, a structured action, or both. The engine
//! picks one provider at construction time.

use crate::error::EngineError;
use crate::matcher::RuleMatcher;
use crate::models::{EntityMap, IntentType, MessageRole};
use crate::patterns::PhraseTable;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

pub mod remote;
pub use remote::RemoteCompletionProvider;

/// One entry of the prompt history sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    pub role: MessageRole,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A named operation the provider may ask the caller to run
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredAction {
    pub name: String,
    pub arguments: EntityMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderReply {
    pub text: Option<String>,
    pub action: Option<StructuredAction>,
}

impl ProviderReply {
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, str::is_empty) && self.action.is_none()
    }
}

/// Candidate action advertised to the provider
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActionSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Trait for classification backends
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn classify(
        &self,
        history: &[PromptMessage],
        actions: &[ActionSpec],
    ) -> Result<ProviderReply>;
}

//
// ================= Action catalog =================
//

pub const CHECK_ACCOUNT_BALANCE: &str = "check_account_balance";
pub const VIEW_TRANSACTIONS: &str = "view_transactions";
pub const TRANSFER_MONEY: &str = "transfer_money";
pub const ANALYZE_SPENDING: &str = "analyze_spending";
pub const CHECK_LOAN_ELIGIBILITY: &str = "check_loan_eligibility";

/// Fixed catalog advertised on every call
pub fn candidate_actions() -> Vec<ActionSpec> {
    vec![
        ActionSpec {
            name: CHECK_ACCOUNT_BALANCE,
            description: "Check the balance of a user account. If no specific account type is mentioned by the user, omit the accountType parameter to show all balances.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "accountType": {
                        "type": "string",
                        "enum": ["checking", "savings", "credit"],
                        "description": "Type of account to check. Only include if user specifically mentions checking, savings, or credit account."
                    }
                }
            }),
        },
        ActionSpec {
            name: VIEW_TRANSACTIONS,
            description: "View transaction history for an account. If user asks for \"payments\", \"last payments\", \"what I paid\", or \"bills paid\", set paymentsOnly=true to show only outgoing money (debits). For \"transactions\" or \"history\", show all transactions.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "accountType": {
                        "type": "string",
                        "enum": ["checking", "savings", "credit"],
                        "description": "Type of account to view transactions for."
                    },
                    "limit": {
                        "type": "number",
                        "description": "Number to return: 3 for \"last\", 5 for \"recent\", 10 for general queries."
                    },
                    "paymentsOnly": {
                        "type": "boolean",
                        "description": "True when user says \"payment(s)\", \"paid\", \"pay\", \"bill(s)\". False for \"transactions\" or \"history\"."
                    }
                }
            }),
        },
        ActionSpec {
            name: TRANSFER_MONEY,
            description: "Transfer money between accounts",
            parameters: json!({
                "type": "object",
                "properties": {
                    "fromAccount": { "type": "string" },
                    "toAccount": { "type": "string" },
                    "amount": { "type": "number" },
                    "description": { "type": "string" }
                },
                "required": ["fromAccount", "toAccount", "amount"]
            }),
        },
        ActionSpec {
            name: ANALYZE_SPENDING,
            description: "Analyze spending patterns and categorize expenses for a time period. Use this when user asks to analyze, categorize, or break down spending.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "period": {
                        "type": "string",
                        "enum": ["week", "month", "quarter", "year"]
                    },
                    "category": {
                        "type": "string",
                        "description": "Specific spending category to analyze (e.g., dining, shopping, transportation, utilities)"
                    }
                },
                "required": ["period"]
            }),
        },
        ActionSpec {
            name: CHECK_LOAN_ELIGIBILITY,
            description: "Check eligibility for a loan product",
            parameters: json!({
                "type": "object",
                "properties": {
                    "loanType": {
                        "type": "string",
                        "enum": ["home", "auto", "personal", "business"]
                    },
                    "amount": { "type": "number" }
                },
                "required": ["loanType"]
            }),
        },
    ]
}

/// Intent for an action name; unknown names are general inquiries
pub fn intent_for_action(name: &str) -> IntentType {
    match name {
        CHECK_ACCOUNT_BALANCE => IntentType::CheckBalance,
        VIEW_TRANSACTIONS => IntentType::ViewTransactions,
        TRANSFER_MONEY => IntentType::TransferMoney,
        ANALYZE_SPENDING => IntentType::SpendingAnalysis,
        CHECK_LOAN_ELIGIBILITY => IntentType::LoanEligibility,
        _ => IntentType::GeneralInquiry,
    }
}

/// Action a rule match should emit, if any
pub fn action_for_intent(intent: IntentType) -> Option<&'static str> {
    match intent {
        IntentType::CheckBalance => Some(CHECK_ACCOUNT_BALANCE),
        IntentType::ViewTransactions => Some(VIEW_TRANSACTIONS),
        IntentType::TransferMoney => Some(TRANSFER_MONEY),
        IntentType::SpendingAnalysis => Some(ANALYZE_SPENDING),
        IntentType::LoanEligibility => Some(CHECK_LOAN_ELIGIBILITY),
        _ => None,
    }
}

/// Parse a raw argument payload into an entity map.
///
/// Anything that is not a JSON object degrades to an empty map. Null
/// values are dropped so absence keeps meaning "not specified".
pub fn parse_action_arguments(raw: &str) -> EntityMap {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => strip_nulls(map),
        Ok(other) => {
            warn!(payload = %other, "Action arguments are not an object, ignoring");
            EntityMap::new()
        }
        Err(e) => {
            warn!(error = %e, "Failed to parse action arguments, ignoring");
            EntityMap::new()
        }
    }
}

fn strip_nulls(map: EntityMap) -> EntityMap {
    map.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

//
// ================= Rule-based provider =================
//

/// Deterministic provider backed by the rule matcher.
/// Keeps the engine functional without any network dependency.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedProvider {
    matcher: RuleMatcher,
}

impl RuleBasedProvider {
    pub fn new(table: PhraseTable) -> Self {
        Self {
            matcher: RuleMatcher::new(table),
        }
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }
}

#[async_trait]
impl CompletionProvider for RuleBasedProvider {
    fn name(&self) -> &'static str {
        "rules"
    }

    async fn classify(
        &self,
        history: &[PromptMessage],
        actions: &[ActionSpec],
    ) -> Result<ProviderReply> {
        let message = history
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .ok_or_else(|| {
                EngineError::Validation("History contains no user message".to_string())
            })?;

        let matched = self.matcher.match_message(&message.content);
        debug!(intent = %matched.intent, "Rule matcher classified message");

        let action = action_for_intent(matched.intent)
            .filter(|name| actions.iter().any(|spec| spec.name == *name))
            .map(|name| StructuredAction {
                name: name.to_string(),
                arguments: matched.entities.clone(),
            });

        Ok(ProviderReply {
            text: Some(matched.response).filter(|t| !t.is_empty()),
            action,
        })
    }
}
