use financial_insight_engine::{
    ClassificationResult, ConversationContext, EngineConfig, ExtractionEngine,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let message = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if message.trim().is_empty() {
        eprintln!("Usage: insight-engine \"<message>\"");
        std::process::exit(2);
    }

    let config = EngineConfig::from_env()?;
    let engine = ExtractionEngine::from_config(&config)?;

    info!(provider = engine.provider_name(), "Insight engine ready");

    let context = ConversationContext::new("cli-user", Uuid::new_v4().to_string());

    let result = match engine.classify(&message, &context).await {
        Ok(result) => result,
        Err(e) if e.is_provider() => {
            error!("Classification failed: {}", e);
            ClassificationResult::apology()
        }
        Err(e) => return Err(e.into()),
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
