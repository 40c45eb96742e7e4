//! `tribuna ingest` — Replace the knowledge base with a local PDF.

use std::path::Path;

use tracing::info;
use tribuna_gateway::AppState;

pub async fn run(config_path: Option<&Path>, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let state = AppState::from_config(config)?;

    let filename = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| format!("Not a file path: {}", file.display()))?
        .to_string();
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
    info!(path = %file.display(), bytes = bytes.len(), "Ingesting local PDF");

    let report = state.pipeline.ingest(&filename, bytes).await?;

    println!("{}", report.message());
    println!("   File:  {} ({} pages)", report.filename, report.pages);

    Ok(())
}
