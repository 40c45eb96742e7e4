pub mod ask;
pub mod doctor;
pub mod ingest;
pub mod serve;

use std::path::Path;

use tribuna_config::AppConfig;

/// Load and validate configuration, with a readable error for the terminal.
pub(crate) fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    AppConfig::load(path).map_err(|e| format!("Failed to load config: {e}").into())
}
