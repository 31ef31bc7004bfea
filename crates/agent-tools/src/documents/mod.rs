//! Document Storage
//!
//! Uploaded-file metadata and contents, keyed by file id and owned by an agent.

mod memory;
pub mod pdf;

pub use memory::MemoryDocumentStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for one uploaded file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub agent_id: String,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

/// Storage backend for uploaded files (Strategy pattern)
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Files uploaded for an agent, newest first
    async fn list(&self, agent_id: &str) -> Result<Vec<FileRecord>>;

    /// Metadata for one file
    async fn get(&self, file_id: &str) -> Result<Option<FileRecord>>;

    /// Raw file bytes
    async fn read(&self, file_id: &str) -> Result<Vec<u8>>;
}

/// Human-readable size: `B` under 1 KiB, then `KB` / `MB` with one decimal
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if bytes < KIB {
        format!("{} B", bytes)
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(2048), "2.0 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }
}
