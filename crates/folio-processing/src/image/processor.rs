//! Image processor - decoding and dimension probing

use crate::error::ProcessingError;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an encoded image, guessing the format from its magic bytes.
    pub fn decode(data: &[u8]) -> Result<DynamicImage, ProcessingError> {
        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessingError::Decode(e.to_string()))?;
        if reader.format().is_none() {
            return Err(ProcessingError::Decode(
                "unrecognized image format".to_string(),
            ));
        }
        reader
            .decode()
            .map_err(|e| ProcessingError::Decode(e.to_string()))
    }

    /// Pixel dimensions of an encoded image. Decodes the full image.
    pub fn dimensions(data: &[u8]) -> Result<(u32, u32), ProcessingError> {
        Ok(Self::decode(data)?.dimensions())
    }

    /// Decode on the blocking pool. Image decode is CPU-bound.
    pub async fn decode_blocking(data: Vec<u8>) -> Result<DynamicImage, ProcessingError> {
        tokio::task::spawn_blocking(move || Self::decode(&data)).await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};

    fn create_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([255, 0, 0, 255]));
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        img.write_to(&mut cursor, ImageFormat::Png).unwrap();
        buffer
    }

    #[test]
    fn test_decode_valid_png() {
        let image_data = create_test_image(120, 80);
        let img = ImageProcessor::decode(&image_data).unwrap();
        assert_eq!(img.dimensions(), (120, 80));
    }

    #[test]
    fn test_decode_invalid_image() {
        let result = ImageProcessor::decode(b"not an image");
        assert!(matches!(result, Err(ProcessingError::Decode(_))));
    }

    #[test]
    fn test_decode_truncated_png() {
        let image_data = create_test_image(64, 64);
        let result = ImageProcessor::decode(&image_data[..image_data.len() / 2]);
        assert!(result.is_err());
    }

    #[test]
    fn test_dimensions() {
        let image_data = create_test_image(100, 50);
        assert_eq!(ImageProcessor::dimensions(&image_data).unwrap(), (100, 50));
    }

    #[tokio::test]
    async fn test_decode_blocking() {
        let image_data = create_test_image(30, 40);
        let img = ImageProcessor::decode_blocking(image_data).await.unwrap();
        assert_eq!(img.dimensions(), (30, 40));
    }
}
