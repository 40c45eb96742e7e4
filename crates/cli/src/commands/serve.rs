//! `tribuna serve` — Start the HTTP API server.

use std::path::Path;

pub async fn run(config_path: Option<&Path>, port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(config_path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("Tribuna — Dr. Wilmer Gálvez Chatbot API");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Planner:   {} ({})", config.llm.model, config.llm.api_url);
    println!("   Store:     {:?}", config.store.backend);

    tribuna_gateway::start(config).await?;

    Ok(())
}
