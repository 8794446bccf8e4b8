//! Folio Processing Library
//!
//! The media pipeline: upload validation, image decoding and variant rendering, the
//! variant policy table, the ingestion orchestrator, and the demo seeder.

pub mod demo;
pub mod error;
pub mod image;
pub mod ingest;
pub mod validator;
pub mod variants;

// Re-export commonly used types
pub use demo::{DemoImage, DemoSeeder};
pub use error::ProcessingError;
pub use crate::image::{
    fill_crop_rect, fit_dimensions, ImageProcessor, ImageResizer, RenderedVariant, VariantRenderer,
};
pub use ingest::{BatchItem, IngestLimits, IngestRequest, IngestionService, UploadReader};
pub use crate::validator::{
    guess_content_type, sanitize_filename, MediaValidator, ValidationError,
};
pub use variants::{VariantPlan, VariantPolicy};
