//! Ingestion pipeline
//!
//! [`IngestionService`] persists an upload's original, records it, and derives the
//! variants named by the [`VariantPolicy`](crate::variants::VariantPolicy).

pub mod service;
pub mod types;

pub use service::IngestionService;
pub use types::{BatchItem, IngestLimits, IngestRequest, UploadReader};
