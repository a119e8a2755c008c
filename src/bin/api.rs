use finley::{
    api::start_server,
    assistant::BudgetAssistant,
    config::AgentConfig,
    llm::WatsonxClient,
    state::InMemoryBudgetStore,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = match AgentConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Set WATSONX_API_KEY and WATSONX_PROJECT_ID in .env");
            return Err(e.into());
        }
    };

    info!("Finley budget assistant - API Server");
    info!(port = config.port, model = %config.llm.model_id, "Configuration loaded");

    // Create components
    let model = Arc::new(WatsonxClient::new(config.llm.clone())?);
    let store = Arc::new(InMemoryBudgetStore::new());
    let assistant = Arc::new(BudgetAssistant::new(model, store, &config));

    info!("Assistant initialized, starting API server");

    start_server(assistant, config.port).await?;

    Ok(())
}
