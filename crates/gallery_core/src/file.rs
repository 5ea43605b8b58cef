use std::{io, path::Path};

use base64::{engine::general_purpose::STANDARD, Engine as _};

const FALLBACK_MIME: &str = "application/octet-stream";

/// An image picked for upload, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: None,
            bytes,
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub async fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn resolved_mime_type(&self) -> String {
        self.mime_type
            .as_deref()
            .map(str::trim)
            .filter(|mime| !mime.is_empty())
            .map(str::to_owned)
            .or_else(|| {
                mime_guess::from_path(&self.name)
                    .first()
                    .map(|mime| mime.essence_str().to_owned())
            })
            .unwrap_or_else(|| FALLBACK_MIME.to_owned())
    }

    /// Inline `data:` URI for the file. Uploads embed the payload in the row
    /// instead of referencing blob storage.
    pub fn to_data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.resolved_mime_type(),
            STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
#[path = "tests/file_tests.rs"]
mod tests;
