//! `tribuna doctor` — Check configuration, planner and knowledge store.

use std::path::Path;

use tribuna_config::{AppConfig, DEFAULT_CONFIG_FILE};

pub async fn run(config_path: Option<&Path>, print_defaults: bool) -> Result<(), Box<dyn std::error::Error>> {
    if print_defaults {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    println!("Tribuna Doctor — System Diagnostics");
    println!("===================================\n");

    let mut issues = 0;

    // Config file (optional)
    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let mut config = match AppConfig::load_from(path) {
        Ok(config) => {
            if path.exists() {
                println!("  ✅ Config file valid: {}", path.display());
            } else {
                println!("  ℹ️  No config file at {}, using defaults", path.display());
            }
            config
        }
        Err(e) => {
            println!("  ❌ Config file invalid: {e}");
            println!("\n  1 issue(s) found. See above for details.");
            return Ok(());
        }
    };

    // Environment + validation
    if let Err(e) = config.apply_env(|name| std::env::var(name).ok()) {
        println!("  ❌ {e}");
        issues += 1;
    }
    match config.validate() {
        Ok(()) => println!("  ✅ Credentials and settings valid"),
        Err(e) => {
            println!("  ❌ {e}");
            println!("\n  {} issue(s) found. See above for details.", issues + 1);
            return Ok(());
        }
    }

    // Planner endpoint
    let planner = tribuna_providers::planner_from_config(&config);
    match planner.health_check().await {
        Ok(true) => println!("  ✅ Planner reachable: {}", config.llm.api_url),
        Ok(false) => {
            println!("  ⚠️  Planner answered but reported unhealthy: {}", config.llm.api_url);
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Planner unreachable: {e}");
            issues += 1;
        }
    }

    // Knowledge store
    let embeddings = tribuna_providers::embedder_from_config(&config);
    let store = tribuna_store::store_from_config(&config, embeddings);
    match store.count().await {
        Ok(n) => println!("  ✅ Knowledge store ({}) holds {n} chunks", store.name()),
        Err(e) => {
            println!("  ❌ Knowledge store ({}) failed: {e}", store.name());
            issues += 1;
        }
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
