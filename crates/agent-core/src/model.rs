//! Model Selection
//!
//! Resolves a stable model id to a live [`ChatModel`] through a catalog of
//! `{provider, model_name}` entries and a table of vendor adapters keyed by
//! provider identifier. Adding a vendor means registering one adapter.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Credentials;
use crate::error::{AgentError, Result};
use crate::provider::{ChatModel, GenerationOptions, ModelInfo, ProviderAdapter, DEFAULT_TEMPERATURE};

/// Catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub provider: String,
    pub model_name: String,
}

impl ModelConfig {
    pub fn new(provider: impl Into<String>, model_name: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model_name: model_name.into(),
        }
    }
}

/// Built-in catalog, in listing order
pub fn default_catalog() -> Vec<(String, ModelConfig)> {
    [
        ("claude-3-7-sonnet-20250219", "anthropic"),
        ("claude-3-5-haiku-20241022", "anthropic"),
        ("claude-3-5-sonnet-20241022", "anthropic"),
        ("gpt-4o-mini", "openai"),
        ("gemini-1.5-flash", "google"),
        ("llama3.2", "ollama"),
    ]
    .into_iter()
    .map(|(id, provider)| (id.to_string(), ModelConfig::new(provider, id)))
    .collect()
}

/// Model catalog plus vendor adapters. Read-only after startup.
pub struct ModelProvider {
    catalog: Vec<(String, ModelConfig)>,
    adapters: HashMap<String, Arc<dyn ProviderAdapter>>,
    credentials: Credentials,
}

impl ModelProvider {
    /// Empty catalog and no adapters
    pub fn new(credentials: Credentials) -> Self {
        Self {
            catalog: Vec::new(),
            adapters: HashMap::new(),
            credentials,
        }
    }

    /// Default catalog, no adapters yet
    pub fn with_default_catalog(credentials: Credentials) -> Self {
        let mut provider = Self::new(credentials);
        provider.catalog = default_catalog();
        provider
    }

    /// Add or replace a catalog entry
    pub fn with_model(mut self, model_id: impl Into<String>, config: ModelConfig) -> Self {
        let model_id = model_id.into();
        match self.catalog.iter_mut().find(|(id, _)| *id == model_id) {
            Some(entry) => entry.1 = config,
            None => self.catalog.push((model_id, config)),
        }
        self
    }

    /// Register a vendor adapter under its provider identifier
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.id().to_string(), adapter);
        self
    }

    pub fn config(&self, model_id: &str) -> Option<&ModelConfig> {
        self.catalog
            .iter()
            .find(|(id, _)| id == model_id)
            .map(|(_, config)| config)
    }

    /// Resolve a model id to a handle bound to the fixed sampling temperature.
    /// Pure lookup and construction: no network traffic happens here.
    pub fn get_model(&self, model_id: &str) -> Result<Arc<dyn ChatModel>> {
        let config = self
            .config(model_id)
            .ok_or_else(|| AgentError::UnsupportedModel(model_id.to_string()))?;

        let adapter = self
            .adapters
            .get(&config.provider)
            .ok_or_else(|| AgentError::UnsupportedProvider(config.provider.clone()))?;

        let credential = self.credentials.get(&config.provider);
        if adapter.requires_credential() && credential.is_none() {
            return Err(AgentError::MissingCredential {
                provider: config.provider.clone(),
            });
        }

        let options = GenerationOptions {
            temperature: DEFAULT_TEMPERATURE,
            ..GenerationOptions::for_model(config.model_name.clone())
        };

        tracing::debug!(model_id, provider = %config.provider, "Resolved model");
        adapter.build(options, credential)
    }

    /// Catalog listing
    pub fn list_models(&self) -> Vec<ModelInfo> {
        self.catalog
            .iter()
            .map(|(id, config)| ModelInfo {
                id: id.clone(),
                name: config.model_name.clone(),
                provider: config.provider.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockAdapter, ScriptedModel};

    fn provider(credentials: Credentials) -> ModelProvider {
        ModelProvider::with_default_catalog(credentials)
            .with_adapter(Arc::new(MockAdapter::new("anthropic", ScriptedModel::new())))
            .with_adapter(Arc::new(MockAdapter::new("openai", ScriptedModel::new())))
            .with_adapter(Arc::new(MockAdapter::keyless("ollama", ScriptedModel::new())))
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = provider(Credentials::new()).get_model("nonexistent-model").err().unwrap();
        assert!(matches!(err, AgentError::UnsupportedModel(id) if id == "nonexistent-model"));
    }

    #[test]
    fn test_missing_credential() {
        let err = provider(Credentials::new()).get_model("gpt-4o-mini").err().unwrap();
        assert!(matches!(err, AgentError::MissingCredential { provider } if provider == "openai"));
    }

    #[test]
    fn test_unknown_provider() {
        let creds = Credentials::new().with("google", "key");
        let err = provider(creds).get_model("gemini-1.5-flash").err().unwrap();
        assert!(matches!(err, AgentError::UnsupportedProvider(p) if p == "google"));
    }

    #[test]
    fn test_resolves_with_fixed_temperature() {
        let creds = Credentials::new().with("anthropic", "key");
        let provider = provider(creds);
        let a = provider.get_model("claude-3-5-haiku-20241022").unwrap();
        let b = provider.get_model("claude-3-5-haiku-20241022").unwrap();
        assert_eq!(a.provider(), "anthropic");
        assert_eq!(a.model_name(), "claude-3-5-haiku-20241022");
        assert_eq!(a.options().temperature, 0.7);
        assert_eq!(a.options().temperature, b.options().temperature);
    }

    #[test]
    fn test_keyless_adapter() {
        let model = provider(Credentials::new()).get_model("llama3.2").unwrap();
        assert_eq!(model.provider(), "ollama");
    }

    #[test]
    fn test_list_models_in_catalog_order() {
        let models = provider(Credentials::new())
            .with_model("custom", ModelConfig::new("openai", "gpt-4.1"))
            .list_models();
        assert_eq!(models[0].id, "claude-3-7-sonnet-20250219");
        assert_eq!(models[0].provider, "anthropic");
        let last = models.last().unwrap();
        assert_eq!(last.id, "custom");
        assert_eq!(last.name, "gpt-4.1");
    }
}
