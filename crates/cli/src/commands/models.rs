//! `localchat models`: List models installed on the model server.

use localchat_config::AppConfig;

use super::doctor::model_installed;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let router = localchat_providers::router::build_from_config(&config);
    let provider = router.default().ok_or("No default provider configured")?;

    let models = provider
        .list_models()
        .await
        .map_err(|e| format!("Could not list models from {}: {e}", provider.name()))?;

    println!("🤖 Models on {} ({})", provider.name(), router.default_name());
    println!("==========================");
    println!();

    if models.is_empty() {
        println!("  No models installed.");
    }
    for name in &models {
        let mut tags = Vec::new();
        if name == &config.default_model {
            tags.push("answer");
        }
        if name == &config.agent.evaluator_model {
            tags.push("evaluator");
        }
        if tags.is_empty() {
            println!("  • {name}");
        } else {
            println!("  • {name}  ({})", tags.join(", "));
        }
    }

    if !model_installed(&models, &config.agent.evaluator_model) {
        println!();
        println!(
            "  ⚠️  Evaluator model '{}' is not installed; web search needs it.",
            config.agent.evaluator_model
        );
    }

    Ok(())
}
