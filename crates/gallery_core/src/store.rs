use std::sync::Arc;

use chrono::Utc;
use shared::{
    domain::{ImageId, ImagePatch, ImageRecord, NewImage},
    error::TableError,
};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    defaults::FallbackImages,
    error::{GalleryError, MutationOp},
    file::ImageFile,
    notify::{self, Notice, Notifier},
    state::GalleryState,
    table::ImageTable,
};

/// Caption fields supplied with an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMeta {
    pub title: String,
    pub description: Option<String>,
}

impl UploadMeta {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Gallery images mirrored from the images table, with a session-local
/// display order on top.
///
/// Every mutation reaches the table first and touches local state only after
/// the table accepted it. Failures are reported through the notifier and
/// returned to the caller; none of them leave the state half-updated.
pub struct GalleryStore {
    table: Arc<dyn ImageTable>,
    notifier: Arc<dyn Notifier>,
    fallback: FallbackImages,
    state: RwLock<GalleryState>,
}

impl GalleryStore {
    pub fn new(
        table: Arc<dyn ImageTable>,
        notifier: Arc<dyn Notifier>,
        fallback: FallbackImages,
    ) -> Self {
        Self {
            table,
            notifier,
            fallback,
            state: RwLock::new(GalleryState::new()),
        }
    }

    /// Creates the store and runs the initial fetch.
    pub async fn open(
        table: Arc<dyn ImageTable>,
        notifier: Arc<dyn Notifier>,
        fallback: FallbackImages,
    ) -> Self {
        let store = Self::new(table, notifier, fallback);
        store.fetch_all().await;
        store
    }

    pub async fn snapshot(&self) -> GalleryState {
        self.state.read().await.clone()
    }

    pub async fn sorted_images(&self) -> Vec<ImageRecord> {
        self.state.read().await.sorted_images()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading()
    }

    pub async fn error(&self) -> Option<GalleryError> {
        self.state.read().await.error().cloned()
    }

    /// Loads the table into the gallery. An empty table or a failed read
    /// leaves the gallery showing the fallback set.
    pub async fn fetch_all(&self) {
        self.state.write().await.begin_loading();

        let fetched = self.table.select_all().await;
        let mut state = self.state.write().await;
        match fetched {
            Ok(rows) if !rows.is_empty() => {
                info!(rows = rows.len(), "gallery: loaded images from table");
                state.adopt(rows);
            }
            Ok(_) => {
                info!(
                    defaults = self.fallback.len(),
                    "gallery: table empty, showing default images"
                );
                state.fall_back(self.fallback.records(Utc::now()), None);
            }
            Err(err) => {
                error!(error = %err, "gallery: fetching images failed, showing default images");
                state.fall_back(
                    self.fallback.records(Utc::now()),
                    Some(GalleryError::Fetch(err)),
                );
            }
        }
    }

    pub async fn upload(
        &self,
        file: &ImageFile,
        meta: UploadMeta,
    ) -> Result<ImageRecord, GalleryError> {
        // Blob storage uploads are blocked on bucket permissions, so the
        // image travels inline in the row.
        let row = NewImage {
            src: file.to_data_uri(),
            title: meta.title,
            description: meta.description.unwrap_or_default(),
        };

        let record = match self.table.insert(&row).await {
            Ok(record) => record,
            Err(err) => {
                error!(error = %err, file = %file.name, "gallery: insert failed");
                self.notify_failure(notify::MSG_UPLOAD_FAILED, &err);
                return Err(GalleryError::mutation(MutationOp::Insert, err));
            }
        };

        self.state.write().await.insert(record.clone());
        info!(id = record.id.0, "gallery: image added");
        self.notifier.notify(Notice::success(notify::MSG_UPLOADED));
        self.notifier.notify(
            Notice::info(notify::MSG_STORAGE_ADVICE)
                .with_duration(notify::STORAGE_ADVICE_DURATION),
        );
        Ok(record)
    }

    pub async fn update(&self, id: ImageId, patch: ImagePatch) -> Result<(), GalleryError> {
        if id.is_synthetic() {
            warn!(id = id.0, "gallery: refusing to update default image");
            self.notifier
                .notify(Notice::warning(notify::MSG_UPDATE_DEFAULT));
            return Err(GalleryError::DefaultImage {
                op: MutationOp::Update,
                id,
            });
        }
        if patch.is_empty() {
            debug!(id = id.0, "gallery: empty patch, nothing to update");
            return Ok(());
        }

        if let Err(err) = self.table.update(id, &patch).await {
            error!(id = id.0, error = %err, "gallery: update failed");
            self.notify_failure(notify::MSG_UPDATE_FAILED, &err);
            return Err(GalleryError::mutation(MutationOp::Update, err));
        }

        if !self.state.write().await.apply_patch(id, &patch) {
            debug!(id = id.0, "gallery: updated image is not held locally");
        }
        info!(id = id.0, "gallery: image updated");
        self.notifier.notify(Notice::success(notify::MSG_UPDATED));
        Ok(())
    }

    pub async fn delete(&self, id: ImageId) -> Result<(), GalleryError> {
        if id.is_synthetic() {
            warn!(id = id.0, "gallery: refusing to delete default image");
            self.notifier
                .notify(Notice::warning(notify::MSG_DELETE_DEFAULT));
            return Err(GalleryError::DefaultImage {
                op: MutationOp::Delete,
                id,
            });
        }
        if !self.state.read().await.contains(id) {
            debug!(id = id.0, "gallery: delete of unknown image ignored");
            return Err(GalleryError::NotFound(id));
        }

        if let Err(err) = self.table.delete(id).await {
            error!(id = id.0, error = %err, "gallery: delete failed");
            self.notify_failure(notify::MSG_DELETE_FAILED, &err);
            return Err(GalleryError::mutation(MutationOp::Delete, err));
        }

        // A concurrent delete may have removed it already.
        if self.state.write().await.remove(id).is_none() {
            debug!(id = id.0, "gallery: deleted image was already gone locally");
        }
        info!(id = id.0, "gallery: image deleted");
        self.notifier.notify(Notice::success(notify::MSG_DELETED));
        Ok(())
    }

    /// Replaces the display order. The order lives only as long as this
    /// store and is never written to the table.
    pub async fn reorder(&self, order: Vec<ImageId>) {
        debug!(len = order.len(), "gallery: display order replaced");
        self.state.write().await.set_order(order);
        self.notifier.notify(Notice::success(notify::MSG_REORDERED));
    }

    fn notify_failure(&self, prefix: &str, err: &TableError) {
        let notice = match err {
            TableError::Rejected { message, .. } => Notice::error(format!("{prefix}{message}")),
            TableError::Transport(_) | TableError::EmptyResponse => {
                Notice::error(notify::MSG_UNEXPECTED)
            }
        };
        self.notifier.notify(notice);
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
