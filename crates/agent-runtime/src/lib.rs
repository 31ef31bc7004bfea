//! # agent-runtime
//!
//! Vendor chat-model adapters for the conversation engine.
//!
//! ## Providers
//!
//! - **Anthropic**: Claude Messages API, native tool use
//! - **OpenAI**: Chat Completions, function tool calls
//! - **Google**: Gemini `generateContent`, function calling
//! - **Ollama**: local inference, prompt-based tool protocol
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_core::Credentials;
//! use agent_runtime::default_model_provider;
//!
//! let models = default_model_provider(Credentials::from_env(), Duration::from_secs(120))?;
//! let model = models.get_model("gpt-4o-mini")?;
//! ```

pub mod anthropic;
pub mod google;
mod http;
pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use ollama::{OllamaAdapter, OllamaConfig};
pub use openai::OpenAiAdapter;

use agent_core::{AgentError, Credentials, ModelProvider, Result};

/// Default catalog with every built-in adapter registered. `timeout` bounds
/// each vendor HTTP request.
pub fn default_model_provider(credentials: Credentials, timeout: Duration) -> Result<ModelProvider> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

    Ok(ModelProvider::with_default_catalog(credentials)
        .with_adapter(Arc::new(AnthropicAdapter::new(client.clone())))
        .with_adapter(Arc::new(OpenAiAdapter::new(client.clone())))
        .with_adapter(Arc::new(GoogleAdapter::new(client.clone())))
        .with_adapter(Arc::new(OllamaAdapter::from_env(client))))
}
