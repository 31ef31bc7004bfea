//! Chat History & Access
//!
//! Collaborator contracts for persisted per-agent history and for agent
//! ownership checks, plus an in-memory implementation of both (for
//! development/testing).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::message::Message;

/// Persisted, ordered chat history per agent
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// History oldest-first; empty when the agent has none
    async fn get(&self, agent_id: &str) -> Result<Vec<Message>>;

    /// Append messages to the end of an agent's history
    async fn append(&self, agent_id: &str, messages: Vec<Message>) -> Result<()>;

    /// Drop an agent's history
    async fn clear(&self, agent_id: &str) -> Result<()>;
}

/// Whether a user may act on an agent (and read its files)
#[async_trait]
pub trait AuthorizationCheck: Send + Sync {
    /// Owning user of an agent; `None` when the agent is unknown
    async fn owner(&self, agent_id: &str) -> Result<Option<String>>;

    async fn is_authorized(&self, user_id: &str, agent_id: &str) -> Result<bool> {
        Ok(self.owner(agent_id).await?.is_some_and(|owner| owner == user_id))
    }
}

#[derive(Default)]
struct AgentEntry {
    owner: Option<String>,
    history: Vec<Message>,
}

/// In-memory history store and ownership table
#[derive(Default)]
pub struct MemoryHistoryStore {
    agents: RwLock<HashMap<String, AgentEntry>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `user_id` as the owner of `agent_id`
    pub async fn register_agent(&self, agent_id: &str, user_id: &str) {
        let mut agents = self.agents.write().await;
        agents.entry(agent_id.to_string()).or_default().owner = Some(user_id.to_string());
    }

    /// Seed history directly (tests, imports)
    pub async fn with_history(self, agent_id: &str, history: Vec<Message>) -> Self {
        self.agents
            .write()
            .await
            .entry(agent_id.to_string())
            .or_default()
            .history = history;
        self
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn get(&self, agent_id: &str) -> Result<Vec<Message>> {
        let agents = self.agents.read().await;
        Ok(agents.get(agent_id).map(|a| a.history.clone()).unwrap_or_default())
    }

    async fn append(&self, agent_id: &str, messages: Vec<Message>) -> Result<()> {
        let mut agents = self.agents.write().await;
        agents.entry(agent_id.to_string()).or_default().history.extend(messages);
        Ok(())
    }

    async fn clear(&self, agent_id: &str) -> Result<()> {
        let mut agents = self.agents.write().await;
        if let Some(entry) = agents.get_mut(agent_id) {
            entry.history.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl AuthorizationCheck for MemoryHistoryStore {
    async fn owner(&self, agent_id: &str) -> Result<Option<String>> {
        let agents = self.agents.read().await;
        Ok(agents.get(agent_id).and_then(|a| a.owner.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryHistoryStore::new();
        assert!(store.get("a1").await.unwrap().is_empty());

        store.append("a1", vec![Message::user("Hi")]).await.unwrap();
        store.append("a1", vec![Message::assistant("Hello!")]).await.unwrap();

        let history = store.get("a1").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].content, "Hello!");

        store.clear("a1").await.unwrap();
        assert!(store.get("a1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ownership() {
        let store = MemoryHistoryStore::new();
        store.register_agent("a1", "alice").await;

        assert!(store.is_authorized("alice", "a1").await.unwrap());
        assert!(!store.is_authorized("bob", "a1").await.unwrap());
        assert!(!store.is_authorized("alice", "unknown").await.unwrap());
        assert_eq!(store.owner("a1").await.unwrap().as_deref(), Some("alice"));
        assert!(store.owner("unknown").await.unwrap().is_none());
    }
}
