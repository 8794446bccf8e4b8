//! Demo content seeding
//!
//! Generates a handful of solid-color PNGs and ingests them through
//! [`IngestionService::ensure_present`], so seeding twice is a no-op.

use folio_core::models::EnsureOutcome;
use folio_core::AppError;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use tokio_util::sync::CancellationToken;

use crate::error::ProcessingError;
use crate::ingest::{IngestRequest, IngestionService};

/// One generated demo image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoImage {
    pub filename: String,
    pub width: u32,
    pub height: u32,
    pub color: [u8; 3],
}

impl DemoImage {
    pub fn new(filename: impl Into<String>, width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            filename: filename.into(),
            width,
            height,
            color,
        }
    }

    /// Render as PNG bytes. CPU-bound; call from the blocking pool.
    pub fn render_png(&self) -> Result<Vec<u8>, ProcessingError> {
        if self.width == 0 || self.height == 0 {
            return Err(ProcessingError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let img = RgbImage::from_pixel(self.width, self.height, Rgb(self.color));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|e| ProcessingError::Encode(e.to_string()))?;
        Ok(buffer)
    }
}

pub struct DemoSeeder {
    uploaded_by: i64,
    images: Vec<DemoImage>,
}

impl DemoSeeder {
    /// Seeder with the default set: a landscape, a portrait, a square and an icon
    /// small enough that only the cropped thumbnail is produced.
    pub fn new(uploaded_by: i64) -> Self {
        Self {
            uploaded_by,
            images: vec![
                DemoImage::new("demo-landscape.png", 2400, 1600, [52, 101, 164]),
                DemoImage::new("demo-portrait.png", 900, 1600, [78, 154, 6]),
                DemoImage::new("demo-square.png", 1200, 1200, [204, 0, 0]),
                DemoImage::new("demo-icon.png", 100, 100, [237, 212, 0]),
            ],
        }
    }

    pub fn with_images(mut self, images: Vec<DemoImage>) -> Self {
        self.images = images;
        self
    }

    pub fn images(&self) -> &[DemoImage] {
        &self.images
    }

    /// Ensure every demo image is present for the configured uploader.
    ///
    /// Stops at the first fatal error; images seeded before it stay in place.
    #[tracing::instrument(skip(self, service, cancel), fields(uploaded_by = self.uploaded_by))]
    pub async fn seed(
        &self,
        service: &IngestionService,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnsureOutcome>, AppError> {
        let mut outcomes = Vec::with_capacity(self.images.len());

        for demo in &self.images {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled("demo seeding".to_string()));
            }

            let image = demo.clone();
            let bytes = tokio::task::spawn_blocking(move || image.render_png())
                .await
                .map_err(ProcessingError::from)??;

            let request = IngestRequest::new(&demo.filename, "image/png", self.uploaded_by)
                .with_alt(format!("Demo image {}x{}", demo.width, demo.height));
            let outcome = service
                .ensure_present(request, Cursor::new(bytes), cancel)
                .await?;

            tracing::info!(
                filename = %demo.filename,
                media_id = outcome.media.id,
                created = outcome.created,
                variants = outcome.variants.len(),
                "Demo image ready"
            );
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageProcessor, ImageResizer};
    use crate::ingest::IngestLimits;
    use crate::variants::VariantPolicy;
    use folio_db::{InMemoryMediaStore, MediaStore};
    use folio_storage::LocalStorage;
    use image::GenericImageView;
    use std::sync::Arc;

    #[test]
    fn test_render_png_dimensions() {
        let demo = DemoImage::new("x.png", 30, 20, [1, 2, 3]);
        let bytes = demo.render_png().unwrap();
        let decoded = ImageProcessor::decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (30, 20));
    }

    #[test]
    fn test_render_png_rejects_zero() {
        let demo = DemoImage::new("x.png", 0, 20, [1, 2, 3]);
        assert!(demo.render_png().is_err());
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let store = Arc::new(InMemoryMediaStore::new());
        let service = IngestionService::new(
            storage,
            store.clone(),
            Arc::new(ImageResizer),
            VariantPolicy::default(),
            IngestLimits::default(),
        );
        let seeder = DemoSeeder::new(7).with_images(vec![
            DemoImage::new("a.png", 500, 400, [10, 10, 10]),
            DemoImage::new("b.png", 100, 100, [20, 20, 20]),
        ]);
        let cancel = CancellationToken::new();

        let first = seeder.seed(&service, &cancel).await.unwrap();
        assert!(first.iter().all(|o| o.created));
        let media_after_first = store.count_media().await.unwrap();
        let variants_after_first = store.count_variants().await.unwrap();
        assert_eq!(media_after_first, 2);
        // a.png: thumbnail + small; b.png: thumbnail only
        assert_eq!(variants_after_first, 3);

        let second = seeder.seed(&service, &cancel).await.unwrap();
        assert!(second.iter().all(|o| !o.created));
        assert_eq!(second[0].media.id, first[0].media.id);
        assert_eq!(second[0].variants.len(), 2);
        assert_eq!(store.count_media().await.unwrap(), media_after_first);
        assert_eq!(store.count_variants().await.unwrap(), variants_after_first);
    }
}
