//! Image processing module
//!
//! - Decoding and dimension probing of uploads (processor)
//! - Variant rendering: fit/fill geometry, Lanczos3 scaling, PNG encoding (resize)

pub mod processor;
pub mod resize;

pub use processor::ImageProcessor;
pub use resize::{fill_crop_rect, fit_dimensions, ImageResizer, RenderedVariant, VariantRenderer};
