//! Financial Insight Engine
//!
//! Two independent halves:
//! - Intent extraction: free-text banking requests become an intent,
//!   typed entities and a reply, via a pluggable completion provider
//!   (deterministic rule matcher or a remote function-calling endpoint)
//! - Insights: pure analytics over transaction lists (category patterns,
//!   spending alerts, budget checks, balance projection) plus chart and
//!   table shaping for display
//!
//! No persistence and no transport; callers own both.

pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod insights;
pub mod matcher;
pub mod models;
pub mod patterns;
pub mod provider;
pub mod visualization;

pub use error::{EngineError, Result};

// Re-export common types
pub use config::EngineConfig;
pub use engine::ExtractionEngine;
pub use models::*;
pub use provider::{CompletionProvider, RemoteCompletionProvider, RuleBasedProvider};
