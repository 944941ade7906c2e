//! Remote completion provider
//!
//! Calls an external chat-completion endpoint with function calling.
//! One request per classification; a long-lived reqwest::Client keeps
//! connections pooled.

use crate::config::RemoteSettings;
use crate::error::EngineError;
use crate::provider::{
    parse_action_arguments, ActionSpec, CompletionProvider, PromptMessage, ProviderReply,
    StructuredAction,
};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

pub struct RemoteCompletionProvider {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
}

impl RemoteCompletionProvider {
    pub fn new(settings: &RemoteSettings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| {
                EngineError::Configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: settings.base_url.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for RemoteCompletionProvider {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn classify(
        &self,
        history: &[PromptMessage],
        actions: &[ActionSpec],
    ) -> Result<ProviderReply> {
        let request = CompletionRequest {
            model: &self.model,
            messages: history,
            function_call: (!actions.is_empty()).then_some("auto"),
            functions: actions,
        };

        info!(model = %self.model, messages = history.len(), "Calling completion endpoint");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Completion request failed: {}", e);
                EngineError::Provider(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Completion endpoint error response: {}", error_text);
            return Err(EngineError::Provider(format!(
                "Completion endpoint returned {}: {}",
                status, error_text
            )));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion response: {}", e);
            EngineError::Provider(format!("Completion parse error: {}", e))
        })?;

        let reply = reply_from_completion(completion)?;

        info!(
            has_text = reply.text.is_some(),
            action = ?reply.action.as_ref().map(|a| a.name.as_str()),
            "Completion response received"
        );

        Ok(reply)
    }
}

/// Convert the first choice into a provider reply
fn reply_from_completion(completion: CompletionResponse) -> Result<ProviderReply> {
    let choice = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::Provider("No choices in completion response".to_string()))?;

    let reply = ProviderReply {
        text: choice.message.content.filter(|t| !t.is_empty()),
        action: choice.message.function_call.map(|call| StructuredAction {
            arguments: parse_action_arguments(&call.arguments),
            name: call.name,
        }),
    };

    if reply.is_empty() {
        return Err(EngineError::Provider(
            "Completion contained neither text nor an action".to_string(),
        ));
    }

    Ok(reply)
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [PromptMessage],
    #[serde(skip_serializing_if = "no_actions")]
    functions: &'a [ActionSpec],
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<&'static str>,
}

fn no_actions(actions: &&[ActionSpec]) -> bool {
    actions.is_empty()
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    function_call: Option<FunctionCall>,
}

#[derive(Debug, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use crate::provider::candidate_actions;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let history = vec![
            PromptMessage::new(MessageRole::System, "You are a banking assistant"),
            PromptMessage::new(MessageRole::User, "What's my balance?"),
        ];
        let actions = candidate_actions();
        let request = CompletionRequest {
            model: "gpt-4-turbo-preview",
            messages: &history,
            functions: &actions,
            function_call: Some("auto"),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], json!("system"));
        assert_eq!(value["functions"].as_array().unwrap().len(), 5);
        assert_eq!(value["function_call"], json!("auto"));
    }

    #[test]
    fn test_empty_catalog_omits_functions() {
        let history = vec![PromptMessage::new(MessageRole::User, "hi")];
        let request = CompletionRequest {
            model: "m",
            messages: &history,
            functions: &[],
            function_call: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("functions").is_none());
        assert!(value.get("function_call").is_none());
    }

    #[test]
    fn test_function_call_with_bad_arguments_keeps_action() {
        let completion: CompletionResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "function_call": { "name": "transfer_money", "arguments": "{amount: 5" }
                }
            }]
        }))
        .unwrap();

        let reply = reply_from_completion(completion).unwrap();
        let action = reply.action.unwrap();
        assert_eq!(action.name, "transfer_money");
        assert!(action.arguments.is_empty());
        assert!(reply.text.is_none());
    }

    #[test]
    fn test_empty_message_is_provider_error() {
        let completion: CompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "" } }]
        }))
        .unwrap();

        let err = reply_from_completion(completion).unwrap_err();
        assert!(err.is_provider());
    }

    #[test]
    fn test_no_choices_is_provider_error() {
        let completion: CompletionResponse = serde_json::from_value(json!({})).unwrap();
        assert!(reply_from_completion(completion).unwrap_err().is_provider());
    }
}
