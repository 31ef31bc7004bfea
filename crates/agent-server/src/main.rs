//! Agent conversation HTTP server
//!
//! Axum transport over [`agent_core::ConversationEngine`]: single-turn and
//! tool-augmented questions, stored-agent chat with history, and catalog
//! listings.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{ConversationEngine, Credentials, EngineConfig, MemoryHistoryStore};
use agent_runtime::default_model_provider;
use agent_tools::{
    default_registry,
    documents::MemoryDocumentStore,
    search::{SearchBackend, SerpApiClient, WikipediaClient},
    svckit::SystemClock,
    ToolBackends,
};

use crate::handlers::{
    ask, ask_with_tools, chat, clear_history, create_agent, health_check, history, list_models, list_tools,
    upload_file,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = EngineConfig::from_env();
    let credentials = Credentials::from_env();
    for provider in ["anthropic", "openai", "google"] {
        if credentials.get(provider).is_none() {
            tracing::warn!(provider, "No API key configured; its models will be rejected");
        }
    }
    let models = default_model_provider(credentials, config.model_timeout)?;

    let http = reqwest::Client::builder().timeout(config.model_timeout).build()?;
    let search = SerpApiClient::from_env(http.clone()).map(|c| Arc::new(c) as Arc<dyn SearchBackend>);
    if search.is_none() {
        tracing::warn!("SERPAPI_API_KEY not set - web_search will report that search is not configured");
    }

    let agents = Arc::new(MemoryHistoryStore::new());
    let documents = Arc::new(MemoryDocumentStore::new());
    let tools = default_registry(ToolBackends {
        search,
        wikipedia: Arc::new(WikipediaClient::new(http)),
        clock: Arc::new(SystemClock),
        documents: documents.clone(),
        access: agents.clone(),
    });

    tracing::info!("Registered {} tools in {} categories:", tools.len(), tools.category_keys().len());
    for key in tools.category_keys() {
        tracing::info!("  • {}", key);
    }

    let engine = ConversationEngine::new(Arc::new(models), Arc::new(tools), agents.clone(), config)
        .with_access_check(agents.clone());

    let state = AppState {
        engine: Arc::new(engine),
        agents,
        documents,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health_check))
        // Stateless engine surface
        .route("/api/langchain/models", get(list_models))
        .route("/api/langchain/tools", get(list_tools))
        .route("/api/langchain/ask", post(ask))
        .route("/api/langchain/agent", post(ask_with_tools))
        // Stored agents
        .route("/api/ai-agents", post(create_agent))
        .route("/api/ai-agents/{agent_id}/files", post(upload_file))
        .route("/api/ai-agents/{agent_id}/chat", post(chat))
        .route("/api/ai-agents/{agent_id}/history", get(history))
        .route("/api/ai-agents/{agent_id}/clear-history", post(clear_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("agent server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                                 - Health check");
    tracing::info!("  GET  /api/langchain/models                   - List models");
    tracing::info!("  GET  /api/langchain/tools                    - List tool categories");
    tracing::info!("  POST /api/langchain/ask                      - Single-turn question");
    tracing::info!("  POST /api/langchain/agent                    - Question with tools");
    tracing::info!("  POST /api/ai-agents                          - Create agent");
    tracing::info!("  POST /api/ai-agents/{{id}}/files               - Upload text file");
    tracing::info!("  POST /api/ai-agents/{{id}}/chat                - Chat with agent");
    tracing::info!("  GET  /api/ai-agents/{{id}}/history             - Conversation history");
    tracing::info!("  POST /api/ai-agents/{{id}}/clear-history       - Clear history");

    axum::serve(listener, app).await?;

    Ok(())
}
