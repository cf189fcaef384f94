pub mod ask;
pub mod chat;
pub mod doctor;
pub mod models;
pub mod onboard;
mod render;

use std::sync::Arc;

use localchat_agent::Responder;
use localchat_config::AppConfig;
use localchat_core::provider::Provider;
use localchat_search::SearxngProvider;

/// Everything a chat-style command needs.
pub struct Session {
    pub config: AppConfig,
    pub provider: Arc<dyn Provider>,
    pub responder: Responder,
    pub answer_model: String,
}

impl Session {
    pub fn load(model_override: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

        let router = localchat_providers::router::build_from_config(&config);
        let provider = router.default().ok_or("No default provider configured")?;
        let search = Arc::new(SearxngProvider::from_config(&config.search));
        let responder = Responder::from_config(Arc::clone(&provider), search, &config);

        let answer_model = model_override.unwrap_or_else(|| {
            config
                .providers
                .get(&config.default_provider)
                .and_then(|p| p.default_model.clone())
                .unwrap_or_else(|| config.default_model.clone())
        });

        tracing::debug!(
            provider = %config.default_provider,
            model = %answer_model,
            evaluator = %config.agent.evaluator_model,
            "Session ready"
        );

        Ok(Self {
            config,
            provider,
            responder,
            answer_model,
        })
    }
}
