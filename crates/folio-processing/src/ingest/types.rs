//! Types for the ingestion pipeline.

use folio_core::Config;
use std::pin::Pin;
use tokio::io::AsyncRead;

const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Boxed upload stream, used where readers of different types share a collection.
pub type UploadReader = Pin<Box<dyn AsyncRead + Send>>;

/// Caller-supplied description of one upload. The bytes travel separately as a reader.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub filename: String,
    pub mime_type: String,
    pub uploaded_by: i64,
    pub folder_id: Option<i64>,
    pub alt: Option<String>,
    pub caption: Option<String>,
}

impl IngestRequest {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, uploaded_by: i64) -> Self {
        Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            uploaded_by,
            folder_id: None,
            alt: None,
            caption: None,
        }
    }

    pub fn with_folder(mut self, folder_id: Option<i64>) -> Self {
        self.folder_id = folder_id;
        self
    }

    pub fn with_alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = Some(alt.into());
        self
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// One entry of a batch ingestion.
pub struct BatchItem {
    pub request: IngestRequest,
    pub reader: UploadReader,
}

impl BatchItem {
    pub fn new<R>(request: IngestRequest, reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            request,
            reader: Box::pin(reader),
        }
    }
}

/// Upload limits enforced during validation.
#[derive(Debug, Clone)]
pub struct IngestLimits {
    pub max_file_size: usize,
    pub allowed_content_types: Vec<String>,
}

impl IngestLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_file_size: config.max_file_size_bytes(),
            allowed_content_types: config.allowed_content_types().to_vec(),
        }
    }
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_content_types: [
                "image/jpeg",
                "image/png",
                "image/gif",
                "image/webp",
                "application/pdf",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}
