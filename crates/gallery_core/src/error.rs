use std::fmt;

use shared::{domain::ImageId, error::TableError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Insert,
    Update,
    Delete,
}

impl fmt::Display for MutationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GalleryError {
    /// Remote read failed; the store fell back to the default set.
    #[error("failed to fetch gallery images: {0}")]
    Fetch(#[source] TableError),
    #[error("{op} failed: {source}")]
    Mutation {
        op: MutationOp,
        #[source]
        source: TableError,
    },
    #[error("cannot {op} default image {id}")]
    DefaultImage { op: MutationOp, id: ImageId },
    #[error("image {0} is not in the gallery")]
    NotFound(ImageId),
}

impl GalleryError {
    pub fn mutation(op: MutationOp, source: TableError) -> Self {
        Self::Mutation { op, source }
    }
}
