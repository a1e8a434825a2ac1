use intellichat_orchestrator::{
    api::start_server, config::AppConfig, dialog::DialogOrchestrator,
    oracle::create_default_oracle, registry::create_default_registry,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    if config.oracle.gemini_api_key.is_none() {
        info!("GEMINI_API_KEY not set, all prompts stay on the local model");
    }

    info!("IntelliChat - API Server");
    info!("Port: {}", config.api_port);
    info!("Local model: {} at {}", config.oracle.ollama_model, config.oracle.ollama_url);

    // Create components
    let oracle = create_default_oracle(&config.oracle)?;
    let registry = Arc::new(create_default_registry(&config, oracle.clone()).await?);
    let orchestrator = Arc::new(DialogOrchestrator::new(oracle, registry, config.dialog.clone()));

    info!("Orchestrator initialized");

    start_server(orchestrator, config.api_port, config.session_idle_ttl).await?;

    Ok(())
}
