//! Application State

use std::sync::Arc;

use agent_core::{ConversationEngine, MemoryHistoryStore};
use agent_tools::documents::MemoryDocumentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Conversation engine with models, tools and history wired in
    pub engine: Arc<ConversationEngine>,

    /// Agent ownership table (also the engine's history store)
    pub agents: Arc<MemoryHistoryStore>,

    /// Uploaded files read by the `files` tools
    pub documents: Arc<MemoryDocumentStore>,
}
