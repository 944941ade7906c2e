//! Engine configuration
//!
//! Provider selection is a deployment-time decision read once from the
//! environment. A misconfigured remote endpoint fails here, at startup,
//! never per request.

use crate::error::EngineError;
use crate::Result;
use reqwest::Url;
use std::env;
use tracing::info;

pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Rules,
    Remote,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub provider: ProviderKind,
    pub remote: Option<RemoteSettings>,
    /// Number of prior non-system messages forwarded to the provider
    pub history_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Rules,
            remote: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let force_rules = get("USE_MOCK_OPENAI").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        let provider = if force_rules {
            ProviderKind::Rules
        } else {
            match get("COMPLETION_PROVIDER").as_deref().map(str::to_lowercase).as_deref() {
                None | Some("rules") | Some("mock") => ProviderKind::Rules,
                Some("remote") | Some("openai") => ProviderKind::Remote,
                Some(other) => {
                    return Err(EngineError::Configuration(format!(
                        "Unknown COMPLETION_PROVIDER: {}",
                        other
                    )))
                }
            }
        };

        let history_limit = match get("HISTORY_LIMIT") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(EngineError::Configuration(format!(
                        "HISTORY_LIMIT must be a positive integer, got {}",
                        raw
                    )))
                }
            },
            None => DEFAULT_HISTORY_LIMIT,
        };

        let remote = match provider {
            ProviderKind::Rules => None,
            ProviderKind::Remote => {
                let api_key = get("COMPLETION_API_KEY")
                    .or_else(|| get("OPENAI_API_KEY"))
                    .ok_or_else(|| {
                        EngineError::Configuration(
                            "Remote provider selected but COMPLETION_API_KEY is not set"
                                .to_string(),
                        )
                    })?;

                let base_url = get("COMPLETION_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_COMPLETION_URL.to_string());
                let parsed = Url::parse(&base_url).map_err(|e| {
                    EngineError::Configuration(format!(
                        "Invalid COMPLETION_BASE_URL {}: {}",
                        base_url, e
                    ))
                })?;
                if !matches!(parsed.scheme(), "http" | "https") {
                    return Err(EngineError::Configuration(format!(
                        "COMPLETION_BASE_URL must be http(s), got {}",
                        parsed.scheme()
                    )));
                }

                Some(RemoteSettings {
                    api_key,
                    base_url,
                    model: get("COMPLETION_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                })
            }
        };

        info!(provider = ?provider, history_limit, "Engine configuration loaded");

        Ok(Self {
            provider,
            remote,
            history_limit,
        })
    }
}
