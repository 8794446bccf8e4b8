//! Variant rendering
//!
//! Two sizing modes:
//! - **fit**: scale down to fit inside the box, preserving aspect ratio. Never upscales.
//! - **fill** (crop): center-crop the source to the box's aspect ratio, then scale to
//!   exactly the box. Upscales smaller sources.
//!
//! Every scale uses Lanczos3 and every rendition is encoded as PNG.

use crate::error::ProcessingError;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

const FILTER: FilterType = FilterType::Lanczos3;

/// Dimensions of `source` scaled to fit inside `target`, preserving aspect ratio.
///
/// A source already inside the box is returned unchanged. Otherwise the binding side
/// equals its bound exactly and the other side is rounded and clamped to `[1, bound]`.
pub fn fit_dimensions(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> (u32, u32) {
    if source_width <= target_width && source_height <= target_height {
        return (source_width, source_height);
    }

    let scale_w = target_width as f64 / source_width as f64;
    let scale_h = target_height as f64 / source_height as f64;

    if scale_w <= scale_h {
        let height = (source_height as f64 * scale_w).round() as u32;
        (target_width, height.clamp(1, target_height))
    } else {
        let width = (source_width as f64 * scale_h).round() as u32;
        (width.clamp(1, target_width), target_height)
    }
}

/// Source rectangle `(x, y, width, height)` that a crop-to-fill keeps: the largest
/// region with the target's aspect ratio, centred on the source.
///
/// Scaling this rectangle to exactly `target` gives the fill result, so the work
/// never exceeds the larger of the source and the target.
pub fn fill_crop_rect(
    source_width: u32,
    source_height: u32,
    target_width: u32,
    target_height: u32,
) -> (u32, u32, u32, u32) {
    let source_wider = source_width as u64 * target_height as u64
        > target_width as u64 * source_height as u64;

    let (crop_width, crop_height) = if source_wider {
        let width = (source_height as f64 * target_width as f64 / target_height as f64).round()
            as u32;
        (width.clamp(1, source_width), source_height)
    } else {
        let height = (source_width as f64 * target_height as f64 / target_width as f64).round()
            as u32;
        (source_width, height.clamp(1, source_height))
    };

    (
        (source_width - crop_width) / 2,
        (source_height - crop_height) / 2,
        crop_width,
        crop_height,
    )
}

/// An encoded rendition and its actual dimensions.
#[derive(Debug, Clone)]
pub struct RenderedVariant {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Produces one encoded rendition of a decoded source.
///
/// Implementations are called on the blocking pool.
pub trait VariantRenderer: Send + Sync {
    fn resize(
        &self,
        source: &DynamicImage,
        target_width: u32,
        target_height: u32,
        crop: bool,
    ) -> Result<RenderedVariant, ProcessingError>;
}

/// Default renderer: Lanczos3 scaling and PNG output
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageResizer;

impl ImageResizer {
    fn scale_to_fit(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (width, height) = fit_dimensions(orig_width, orig_height, target_width, target_height);
        if (width, height) == (orig_width, orig_height) {
            return img.clone();
        }
        img.resize_exact(width, height, FILTER)
    }

    fn scale_to_fill(img: &DynamicImage, target_width: u32, target_height: u32) -> DynamicImage {
        let (orig_width, orig_height) = img.dimensions();
        let (x, y, crop_width, crop_height) =
            fill_crop_rect(orig_width, orig_height, target_width, target_height);

        let cropped = if (crop_width, crop_height) == (orig_width, orig_height) {
            img.clone()
        } else {
            img.crop_imm(x, y, crop_width, crop_height)
        };

        if (crop_width, crop_height) == (target_width, target_height) {
            return cropped;
        }
        cropped.resize_exact(target_width, target_height, FILTER)
    }

    /// Encode as PNG
    pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

impl VariantRenderer for ImageResizer {
    fn resize(
        &self,
        source: &DynamicImage,
        target_width: u32,
        target_height: u32,
        crop: bool,
    ) -> Result<RenderedVariant, ProcessingError> {
        if target_width == 0 || target_height == 0 {
            return Err(ProcessingError::InvalidDimensions {
                width: target_width,
                height: target_height,
            });
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(ProcessingError::Decode("source image is empty".to_string()));
        }

        let output = if crop {
            Self::scale_to_fill(source, target_width, target_height)
        } else {
            Self::scale_to_fit(source, target_width, target_height)
        };

        let (width, height) = output.dimensions();
        let bytes = Self::encode_png(&output)?;

        Ok(RenderedVariant {
            bytes,
            width,
            height,
        })
    }
}
