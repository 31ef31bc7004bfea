//! In-memory document store
//!
//! For testing and demo purposes.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{DocumentStore, FileRecord};
use crate::error::{Result, ToolsError};

#[derive(Default)]
pub struct MemoryDocumentStore {
    files: RwLock<Vec<(FileRecord, Vec<u8>)>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a file for an agent, stamped now; returns its record
    pub async fn upload(&self, agent_id: &str, filename: &str, mime_type: &str, bytes: Vec<u8>) -> FileRecord {
        let record = FileRecord {
            id: uuid::Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            uploaded_at: Utc::now(),
        };
        self.insert(record.clone(), bytes).await;
        record
    }

    /// Store a file with caller-supplied metadata
    pub async fn insert(&self, record: FileRecord, bytes: Vec<u8>) {
        let mut files = self.files.write().await;
        files.retain(|(r, _)| r.id != record.id);
        files.push((record, bytes));
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list(&self, agent_id: &str) -> Result<Vec<FileRecord>> {
        let files = self.files.read().await;
        let mut records: Vec<FileRecord> = files
            .iter()
            .filter(|(r, _)| r.agent_id == agent_id)
            .map(|(r, _)| r.clone())
            .collect();
        records.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(records)
    }

    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>> {
        let files = self.files.read().await;
        Ok(files.iter().find(|(r, _)| r.id == file_id).map(|(r, _)| r.clone()))
    }

    async fn read(&self, file_id: &str) -> Result<Vec<u8>> {
        let files = self.files.read().await;
        files
            .iter()
            .find(|(r, _)| r.id == file_id)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| ToolsError::FileNotFound(file_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_is_newest_first_per_agent() {
        let store = MemoryDocumentStore::new();
        let first = store.upload("a1", "old.txt", "text/plain", b"old".to_vec()).await;
        let mut newer = first.clone();
        newer.id = "f-new".into();
        newer.filename = "new.txt".into();
        newer.uploaded_at = first.uploaded_at + chrono::Duration::seconds(5);
        store.insert(newer, b"new".to_vec()).await;
        store.upload("a2", "other.txt", "text/plain", vec![]).await;

        let listed = store.list("a1").await.unwrap();
        let names: Vec<_> = listed.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, vec!["new.txt", "old.txt"]);

        assert_eq!(store.read(&first.id).await.unwrap(), b"old");
        assert!(store.get("missing").await.unwrap().is_none());
        assert!(store.read("missing").await.is_err());
    }
}
