use async_trait::async_trait;
use shared::{
    domain::{ImageId, ImagePatch, ImageRecord, NewImage},
    error::TableError,
};

mod memory;
mod rest;

pub use memory::MemoryImageTable;
pub use rest::{RestImageTable, RestTableConfig};

pub type TableResult<T> = Result<T, TableError>;

/// Remote images table as the gallery store sees it.
#[async_trait]
pub trait ImageTable: Send + Sync {
    /// All rows, oldest `created_at` first.
    async fn select_all(&self) -> TableResult<Vec<ImageRecord>>;
    /// Inserts one row and returns it with its assigned id.
    async fn insert(&self, image: &NewImage) -> TableResult<ImageRecord>;
    /// Writes the present `title`/`description` fields of the row.
    async fn update(&self, id: ImageId, patch: &ImagePatch) -> TableResult<()>;
    async fn delete(&self, id: ImageId) -> TableResult<()>;
}
