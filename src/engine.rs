//! Intent & entity extraction engine
//!
//! Turns `(message, context)` into a [`ClassificationResult`]:
//! bounded history → configured provider → normalized intent/entities,
//! with a deterministic confirmation sentence when the provider asks for
//! an action without writing any prose.
//!
//! Provider failures are surfaced as `EngineError::Provider`. The engine
//! never swaps in another provider or a default intent on failure.

use crate::config::{EngineConfig, ProviderKind};
use crate::error::EngineError;
use crate::history::HistoryWindow;
use crate::models::{ClassificationResult, ConversationContext, EntityMap, IntentType};
use crate::patterns::{capture, AMOUNT_RE, LOOSE_PERIOD_RE};
use crate::provider::{
    candidate_actions, intent_for_action, ActionSpec, CompletionProvider, RemoteCompletionProvider,
    RuleBasedProvider, ANALYZE_SPENDING, CHECK_ACCOUNT_BALANCE, CHECK_LOAN_ELIGIBILITY,
    TRANSFER_MONEY, VIEW_TRANSACTIONS,
};
use crate::Result;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Keyword precedence for prose replies. First hit wins.
const FALLBACK_KEYWORDS: &[(&[&str], IntentType)] = &[
    (&["balance"], IntentType::CheckBalance),
    (&["transfer", "send"], IntentType::TransferMoney),
    (&["transaction", "history", "payment"], IntentType::ViewTransactions),
    (&["spending", "expense"], IntentType::SpendingAnalysis),
    (&["loan", "eligible"], IntentType::LoanEligibility),
];

pub struct ExtractionEngine {
    provider: Arc<dyn CompletionProvider>,
    window: HistoryWindow,
    actions: Vec<ActionSpec>,
}

impl ExtractionEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>, window: HistoryWindow) -> Self {
        Self {
            provider,
            window,
            actions: candidate_actions(),
        }
    }

    /// Rule-based engine with the canonical phrase table
    pub fn rule_based() -> Self {
        Self::new(Arc::new(RuleBasedProvider::default()), HistoryWindow::default())
    }

    /// Select the provider once, from configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let provider: Arc<dyn CompletionProvider> = match config.provider {
            ProviderKind::Rules => Arc::new(RuleBasedProvider::default()),
            ProviderKind::Remote => {
                let settings = config.remote.as_ref().ok_or_else(|| {
                    EngineError::Configuration(
                        "Remote provider selected without remote settings".to_string(),
                    )
                })?;
                Arc::new(RemoteCompletionProvider::new(settings)?)
            }
        };

        info!(provider = provider.name(), "Extraction engine initialized");

        Ok(Self::new(provider, HistoryWindow::new(config.history_limit)))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Classify a user message against the caller's conversation
    pub async fn classify(
        &self,
        message: &str,
        context: &ConversationContext,
    ) -> Result<ClassificationResult> {
        if message.trim().is_empty() {
            return Err(EngineError::Validation("Message is required".to_string()));
        }

        let history = self.window.build(context, message);
        let reply = self.provider.classify(&history, &self.actions).await?;

        if reply.is_empty() {
            return Err(EngineError::Provider(format!(
                "Provider '{}' returned neither text nor an action",
                self.provider.name()
            )));
        }

        let text = reply.text.filter(|t| !t.is_empty());

        let result = match reply.action {
            Some(action) => {
                let response = text
                    .unwrap_or_else(|| synthesize_response(&action.name, &action.arguments));

                ClassificationResult {
                    response,
                    intent: intent_for_action(&action.name),
                    entities: action.arguments,
                    requires_action: true,
                }
            }
            None => ClassificationResult {
                response: text.unwrap_or_default(),
                intent: fallback_intent(message),
                entities: extract_basic_entities(message),
                requires_action: false,
            },
        };

        info!(
            session_id = %context.session_id,
            provider = self.provider.name(),
            intent = %result.intent,
            requires_action = result.requires_action,
            "Message classified"
        );

        Ok(result)
    }
}

/// Confirmation sentence for an action that arrived without prose
pub fn synthesize_response(action: &str, entities: &EntityMap) -> String {
    let get = |key: &str, default: &str| {
        entity_text(entities, key).unwrap_or_else(|| default.to_string())
    };

    match action {
        CHECK_ACCOUNT_BALANCE => format!(
            "I'll check your {} balance for you. Let me retrieve that information...",
            get("accountType", "account")
        ),
        VIEW_TRANSACTIONS => "I'll show you your recent transactions.".to_string(),
        TRANSFER_MONEY => format!(
            "I can help you transfer ${} from {} to {}.",
            get("amount", "0"),
            get("fromAccount", "your account"),
            get("toAccount", "another account")
        ),
        ANALYZE_SPENDING => format!(
            "Let me analyze your spending patterns for the {} period.",
            get("period", "selected")
        ),
        CHECK_LOAN_ELIGIBILITY => format!(
            "Let me check your eligibility for a {}.",
            get("loanType", "loan")
        ),
        other => {
            warn!(action = other, "No confirmation template for action");
            "I understand you'd like help with that. Let me assist you.".to_string()
        }
    }
}

/// Keyword scan over the raw message for replies without an action
pub fn fallback_intent(message: &str) -> IntentType {
    let lowered = message.to_lowercase();

    FALLBACK_KEYWORDS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, intent)| *intent)
        .unwrap_or(IntentType::GeneralInquiry)
}

/// Amount and period slots from a free-text message
pub fn extract_basic_entities(message: &str) -> EntityMap {
    let mut entities = EntityMap::new();

    if let Some(raw) = capture(&AMOUNT_RE, message) {
        match raw.replace(',', "").parse::<f64>() {
            Ok(amount) if amount.is_finite() => {
                entities.insert("amount".into(), json!(amount));
            }
            _ => warn!(raw, "Ignoring unrepresentable amount"),
        }
    }

    if let Some(period) = capture(&LOOSE_PERIOD_RE, message) {
        entities.insert("period".into(), json!(period.to_lowercase()));
    }

    entities
}

/// Display form of an entity value; empty, zero, false and null read as missing
fn entity_text(entities: &EntityMap, key: &str) -> Option<String> {
    match entities.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => {
            let value = n.as_f64()?;
            if value == 0.0 {
                None
            } else if value.fract() == 0.0 {
                Some(format!("{:.0}", value))
            } else {
                Some(value.to_string())
            }
        }
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}
