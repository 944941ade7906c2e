//! Core data models for the intent and insight engine
//!
//! Field names serialize in camelCase so the surrounding HTTP layer can
//! pass these shapes straight through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::EngineError;

/// Parameter name → loosely typed value. A missing key means "not specified".
pub type EntityMap = Map<String, Value>;

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<EntityMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visualization_data: Option<VisualizationData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_data: Option<TableData>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: MessageMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Rolling conversation state. Owned by the caller; the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
    pub user_id: String,
    pub session_id: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_intent: Option<IntentType>,
    #[serde(default)]
    pub extracted_entities: EntityMap,
}

impl ConversationContext {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            messages: Vec::new(),
            current_intent: None,
            extracted_entities: EntityMap::new(),
        }
    }
}

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    CheckBalance,
    ViewTransactions,
    TransferMoney,
    PayBill,
    SpendingAnalysis,
    SavingsGoal,
    LoanEligibility,
    #[default]
    GeneralInquiry,
    VisualizeData,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::CheckBalance => "check_balance",
            IntentType::ViewTransactions => "view_transactions",
            IntentType::TransferMoney => "transfer_money",
            IntentType::PayBill => "pay_bill",
            IntentType::SpendingAnalysis => "spending_analysis",
            IntentType::SavingsGoal => "savings_goal",
            IntentType::LoanEligibility => "loan_eligibility",
            IntentType::GeneralInquiry => "general_inquiry",
            IntentType::VisualizeData => "visualize_data",
        }
    }
}

/// Output of one `classify` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub response: String,
    pub intent: IntentType,
    pub entities: EntityMap,
    pub requires_action: bool,
}

impl ClassificationResult {
    /// Generic reply for callers that choose to mask provider failures.
    pub fn apology() -> Self {
        Self {
            response: "I'm sorry, I'm having trouble processing your request right now. \
                       Please try again in a moment."
                .to_string(),
            intent: IntentType::GeneralInquiry,
            entities: EntityMap::new(),
            requires_action: false,
        }
    }
}

//
// ================= Transactions =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Debit,
    Credit,
    Transfer,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Debits may be stored signed; insight math always uses the absolute value.
    pub amount: f64,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchant_name: Option<String>,
    #[serde(default)]
    pub status: TransactionStatus,
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    pub fn is_debit(&self) -> bool {
        self.tx_type == TransactionType::Debit
    }

    pub fn is_credit(&self) -> bool {
        self.tx_type == TransactionType::Credit
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    #[default]
    Month,
    Quarter,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Quarter => "quarter",
            Period::Year => "year",
        }
    }
}

impl FromStr for Period {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            "year" => Ok(Period::Year),
            other => Err(EngineError::Validation(format!("Unknown period: {}", other))),
        }
    }
}

//
// ================= Insights =================
//

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Stable,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ComparisonPeriod {
    pub previous: f64,
    /// Percent change versus `previous`
    pub change: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpendingPattern {
    pub category: String,
    pub amount: f64,
    pub percentage: f64,
    pub trend: Trend,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_period: Option<ComparisonPeriod>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InsightType {
    Spending,
    Saving,
    Alert,
    Recommendation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialInsight {
    pub id: String,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub actionable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_data: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRecommendation {
    pub category: String,
    pub current_spending: f64,
    pub recommended_limit: f64,
    pub reasoning: String,
}

//
// ================= Visualization =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Area,
    Scatter,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisualizationData {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub title: String,
    pub data: Vec<ChartPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<ChartConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableData {
    pub title: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl fmt::Display for IntentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_wire_names() {
        let value = serde_json::to_value(IntentType::SpendingAnalysis).unwrap();
        assert_eq!(value, json!("spending_analysis"));

        let parsed: IntentType = serde_json::from_value(json!("general_inquiry")).unwrap();
        assert_eq!(parsed, IntentType::GeneralInquiry);
        assert_eq!(IntentType::default(), IntentType::GeneralInquiry);
    }

    #[test]
    fn test_transaction_deserializes_camel_case() {
        let tx: Transaction = serde_json::from_value(json!({
            "id": "tx-1",
            "accountId": "acc-1",
            "type": "debit",
            "amount": -350.0,
            "category": "dining",
            "description": "Restaurants",
            "status": "completed",
            "timestamp": "2024-03-01T12:00:00Z"
        }))
        .unwrap();

        assert!(tx.is_debit());
        assert_eq!(tx.account_id, "acc-1");
        assert!(tx.merchant_name.is_none());
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("Quarter".parse::<Period>().unwrap(), Period::Quarter);
        assert!("fortnight".parse::<Period>().is_err());
    }

    #[test]
    fn test_chat_message_metadata_is_optional() {
        let msg = ChatMessage::new(MessageRole::User, "hello");
        let value = serde_json::to_value(&msg).unwrap();
        assert!(value.get("metadata").is_none());
        assert_eq!(value["role"], json!("user"));
    }
}
