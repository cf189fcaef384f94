//! `localchat doctor`: Diagnose system health.

use std::sync::Arc;

use localchat_config::AppConfig;
use localchat_core::search::SearchProvider;
use localchat_search::SearxngProvider;

/// Whether `wanted` is among the installed models.
///
/// A bare name matches its `:latest` tag, as Ollama resolves it.
pub fn model_installed(models: &[String], wanted: &str) -> bool {
    models.iter().any(|m| {
        m == wanted || (!wanted.contains(':') && m.strip_suffix(":latest") == Some(wanted))
    })
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 LocalChat Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => {
                println!("  ✅ Config file valid");
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                return Ok(());
            }
        }
    } else {
        println!("  ⚠️  No config file — using defaults (run `localchat onboard`)");
        issues += 1;
        AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?
    };

    // Check model server
    let router = localchat_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;
    match provider.health_check().await {
        Ok(true) => println!("  ✅ Model server reachable ({})", provider.name()),
        Ok(false) => {
            println!("  ❌ Model server answered with an error ({})", provider.name());
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ Model server unreachable ({}): {e}", provider.name());
            issues += 1;
        }
    }

    // Check installed models
    match provider.list_models().await {
        Ok(models) => {
            for (role, model) in [
                ("Answer", &config.default_model),
                ("Evaluator", &config.agent.evaluator_model),
            ] {
                if model_installed(&models, model) {
                    println!("  ✅ {role} model installed: {model}");
                } else {
                    println!("  ❌ {role} model missing: {model}");
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ⚠️  Could not list models: {e}");
            issues += 1;
        }
    }

    // Check SearXNG
    let search: Arc<dyn SearchProvider> = Arc::new(SearxngProvider::from_config(&config.search));
    match search.health_check().await {
        Ok(true) => println!("  ✅ SearXNG answering at {}", config.search.base_url),
        Ok(false) => {
            println!(
                "  ❌ SearXNG at {} returned an error (is the JSON format enabled?)",
                config.search.base_url
            );
            issues += 1;
        }
        Err(e) => {
            println!("  ❌ SearXNG unreachable at {}: {e}", config.search.base_url);
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
