use async_trait::async_trait;
use chrono::Utc;
use shared::domain::{ImageId, ImagePatch, ImageRecord, NewImage};
use tokio::sync::Mutex;

use super::{ImageTable, TableResult};

#[derive(Debug)]
struct MemoryRows {
    next_id: i64,
    rows: Vec<ImageRecord>,
}

/// Process-local table with the same contract as the remote one. Like a
/// filtered update or delete on the remote table, touching a missing id is
/// not an error.
#[derive(Debug)]
pub struct MemoryImageTable {
    inner: Mutex<MemoryRows>,
}

impl MemoryImageTable {
    pub fn new() -> Self {
        Self::with_rows(Vec::new())
    }

    /// Seeds the table. Ids keep counting from the highest seeded id.
    pub fn with_rows(rows: Vec<ImageRecord>) -> Self {
        let next_id = rows.iter().map(|row| row.id.0).max().unwrap_or(0).max(0) + 1;
        Self {
            inner: Mutex::new(MemoryRows { next_id, rows }),
        }
    }

    pub async fn rows(&self) -> Vec<ImageRecord> {
        self.inner.lock().await.rows.clone()
    }
}

impl Default for MemoryImageTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageTable for MemoryImageTable {
    async fn select_all(&self) -> TableResult<Vec<ImageRecord>> {
        let mut rows = self.inner.lock().await.rows.clone();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn insert(&self, image: &NewImage) -> TableResult<ImageRecord> {
        let mut guard = self.inner.lock().await;
        let record = ImageRecord {
            id: ImageId(guard.next_id),
            src: image.src.clone(),
            title: image.title.clone(),
            description: image.description.clone(),
            created_at: Utc::now(),
        };
        guard.next_id += 1;
        guard.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: ImageId, patch: &ImagePatch) -> TableResult<()> {
        let mut guard = self.inner.lock().await;
        if let Some(row) = guard.rows.iter_mut().find(|row| row.id == id) {
            patch.apply_to(row);
        }
        Ok(())
    }

    async fn delete(&self, id: ImageId) -> TableResult<()> {
        self.inner.lock().await.rows.retain(|row| row.id != id);
        Ok(())
    }
}
