//! In-memory file record repository
//!
//! Used when no database is configured and by tests. Records live for the
//! lifetime of the process.

use async_trait::async_trait;
use chrono::Utc;
use stash_core::{AppError, FileRecord};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use super::file::{check_new_record, FileRepository};

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    records: BTreeMap<i64, FileRecord>,
}

/// Process-local [`FileRepository`]
#[derive(Clone, Default)]
pub struct MemoryFileRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored records in id order.
    pub fn records(&self) -> Vec<FileRecord> {
        self.lock().map(|s| s.records.values().cloned().collect()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|s| s.records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("file repository lock poisoned".to_string()))
    }
}

#[async_trait]
impl FileRepository for MemoryFileRepository {
    async fn store(&self, record: FileRecord) -> Result<FileRecord, AppError> {
        check_new_record(&record)?;

        let mut state = self.lock()?;
        state.last_id += 1;
        let id = state.last_id;
        let stored = FileRecord {
            id: Some(id),
            created_at: Some(Utc::now()),
            ..record
        };
        state.records.insert(id, stored.clone());

        tracing::debug!(file_id = id, "File record stored in memory");
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<FileRecord>, AppError> {
        Ok(self.lock()?.records.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_record(owner_id: Option<i64>) -> FileRecord {
        FileRecord {
            origin_url: "http://localhost:3000/image/cat.png".to_string(),
            thumb_url: Some("262x317-cat.png".to_string()),
            ..FileRecord::new_image(owner_id)
        }
    }

    #[tokio::test]
    async fn test_store_assigns_sequential_ids() {
        let repo = MemoryFileRepository::new();

        let first = repo.store(local_record(Some(1))).await.unwrap();
        let second = repo.store(local_record(None)).await.unwrap();

        assert_eq!(first.id, Some(1));
        assert_eq!(second.id, Some(2));
        assert!(first.created_at.is_some());
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn test_get_returns_stored_record() {
        let repo = MemoryFileRepository::new();
        let stored = repo.store(local_record(Some(42))).await.unwrap();

        let fetched = repo.get(stored.id.unwrap()).await.unwrap();
        assert_eq!(fetched, Some(stored));
        assert_eq!(repo.get(99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_record() {
        let repo = MemoryFileRepository::new();
        let record = FileRecord::new_image(None);

        assert!(matches!(
            repo.store(record).await,
            Err(AppError::InvalidRecord(_))
        ));
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_store_rejects_already_persisted_record() {
        let repo = MemoryFileRepository::new();
        let stored = repo.store(local_record(None)).await.unwrap();

        assert!(repo.store(stored).await.is_err());
        assert_eq!(repo.len(), 1);
    }
}
