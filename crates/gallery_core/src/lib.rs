//! Clinic gallery data layer: a store of gallery images mirrored from a
//! remote images table, with default images when the table has nothing to
//! show and a display order that stays local to the session.

pub mod defaults;
pub mod error;
pub mod file;
pub mod notify;
pub mod state;
pub mod store;
pub mod table;

pub use defaults::{DefaultImage, FallbackImages};
pub use error::{GalleryError, MutationOp};
pub use file::ImageFile;
pub use notify::{BroadcastNotifier, Notice, Notifier, Severity, TracingNotifier};
pub use state::GalleryState;
pub use store::{GalleryStore, UploadMeta};
pub use table::{ImageTable, MemoryImageTable, RestImageTable, RestTableConfig, TableResult};
