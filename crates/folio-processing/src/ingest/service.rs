//! Ingestion orchestrator: validate → persist original → media row → variants.

use folio_core::models::{
    BatchOutcome, EnsureOutcome, FailureStage, FileFailure, IngestOutcome, Media,
    MediaMetadataUpdate, MediaVariant, NewMedia, NewMediaVariant, SkipReason, VariantFailure,
    VariantSkip, VariantSpec,
};
use folio_core::{AppError, ErrorMetadata};
use folio_db::MediaStore;
use folio_storage::{Storage, StorageLayout};
use image::DynamicImage;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;
use validator::Validate;

use super::types::{BatchItem, IngestLimits, IngestRequest};
use crate::error::ProcessingError;
use crate::image::{ImageProcessor, VariantRenderer};
use crate::validator::{normalize_content_type, sanitize_filename, MediaValidator};
use crate::variants::{VariantPlan, VariantPolicy};

const MAX_LIST_LIMIT: i64 = 100;

/// An upload that passed validation and is ready to persist.
struct ValidatedUpload {
    filename: String,
    mime_type: String,
    data: Vec<u8>,
    image: Option<Arc<DynamicImage>>,
}

#[derive(Default)]
struct VariantReport {
    variants: Vec<MediaVariant>,
    failures: Vec<VariantFailure>,
    skipped: Vec<VariantSkip>,
}

fn variant_failure(
    variant_type: &str,
    stage: FailureStage,
    message: impl Into<String>,
) -> VariantFailure {
    VariantFailure {
        variant_type: variant_type.to_string(),
        stage,
        message: message.into(),
    }
}

/// Media ingestion and variant generation.
///
/// Holds no mutable state of its own; every call runs in the caller's task with
/// CPU-bound image work moved to the blocking pool.
#[derive(Clone)]
pub struct IngestionService {
    storage: Arc<dyn Storage>,
    store: Arc<dyn MediaStore>,
    renderer: Arc<dyn VariantRenderer>,
    policy: VariantPolicy,
    validator: MediaValidator,
}

impl IngestionService {
    pub fn new(
        storage: Arc<dyn Storage>,
        store: Arc<dyn MediaStore>,
        renderer: Arc<dyn VariantRenderer>,
        policy: VariantPolicy,
        limits: IngestLimits,
    ) -> Self {
        Self {
            storage,
            store,
            renderer,
            policy,
            validator: MediaValidator::new(limits.max_file_size, limits.allowed_content_types),
        }
    }

    pub fn policy(&self) -> &VariantPolicy {
        &self.policy
    }

    /// Ingest one upload.
    ///
    /// Fatal errors (unreadable or invalid input, failed original write, failed media
    /// row) return `Err` and leave nothing behind. Per-variant problems are reported in
    /// the outcome and never abort the ingestion.
    #[tracing::instrument(
        skip(self, request, reader, cancel),
        fields(
            filename = %request.filename,
            uploaded_by = request.uploaded_by,
            media_uuid = tracing::field::Empty
        )
    )]
    pub async fn ingest<R>(
        &self,
        request: IngestRequest,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let start = Instant::now();
        let upload = self.validate(&request, reader).await?;

        let uuid = Uuid::new_v4();
        tracing::Span::current().record("media_uuid", tracing::field::display(uuid));

        let original_key = StorageLayout::original_key(uuid, &upload.filename);
        self.storage
            .write(&original_key, &upload.data)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, key = %original_key, "Failed to persist original");
                AppError::from(e)
            })?;

        let dimensions = upload.image.as_ref().map(|img| (img.width(), img.height()));
        let new_media = NewMedia {
            uuid,
            filename: upload.filename.clone(),
            mime_type: upload.mime_type.clone(),
            size: upload.data.len() as i64,
            width: dimensions.map(|(w, _)| w as i32),
            height: dimensions.map(|(_, h)| h as i32),
            alt: request.alt.clone(),
            caption: request.caption.clone(),
            folder_id: request.folder_id,
            uploaded_by: request.uploaded_by,
        };

        let media = match self.store.create_media(new_media).await {
            Ok(media) => media,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create media row, removing original");
                if let Err(cleanup) = self.storage.delete(&original_key).await {
                    tracing::warn!(
                        error = %cleanup,
                        key = %original_key,
                        "Failed to remove original after media row failure"
                    );
                }
                return Err(e);
            }
        };

        let report = match upload.image {
            Some(image) => {
                self.generate_variants(&media, image, &HashSet::new(), cancel)
                    .await
            }
            None => self.not_raster_report(),
        };

        tracing::info!(
            media_id = media.id,
            size_bytes = media.size,
            variants = report.variants.len(),
            failures = report.failures.len(),
            skipped = report.skipped.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media ingested"
        );

        Ok(IngestOutcome {
            media,
            variants: report.variants,
            failures: report.failures,
            skipped: report.skipped,
        })
    }

    /// Ingest several uploads independently.
    ///
    /// Returns `BatchFailed` only when no item succeeded.
    #[tracing::instrument(skip(self, items, cancel), fields(batch_size = items.len()))]
    pub async fn ingest_batch(
        &self,
        items: Vec<BatchItem>,
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, AppError> {
        if items.is_empty() {
            return Err(AppError::InvalidInput("Batch contains no files".to_string()));
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            let filename = item.request.filename.clone();
            match self.ingest(item.request, item.reader, cancel).await {
                Ok(outcome) => succeeded.push(outcome),
                Err(e) => {
                    tracing::warn!(index, filename = %filename, error = %e, "Batch item failed");
                    failed.push(FileFailure {
                        index,
                        filename,
                        error_code: e.error_code(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if succeeded.is_empty() {
            return Err(AppError::BatchFailed {
                failures: failed
                    .iter()
                    .map(|f| format!("{}: {}", f.filename, f.message))
                    .collect(),
            });
        }

        Ok(BatchOutcome { succeeded, failed })
    }

    /// Ingest unless media with the same display filename already exists for the uploader.
    ///
    /// Check-then-act without a lock: two concurrent calls may both ingest.
    #[tracing::instrument(
        skip(self, request, reader, cancel),
        fields(filename = %request.filename, uploaded_by = request.uploaded_by)
    )]
    pub async fn ensure_present<R>(
        &self,
        request: IngestRequest,
        reader: R,
        cancel: &CancellationToken,
    ) -> Result<EnsureOutcome, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let filename = sanitize_filename(&request.filename)?;

        if let Some(media) = self
            .store
            .find_media_by_filename(request.uploaded_by, &filename)
            .await?
        {
            let variants = self.store.list_variants(media.id).await?;
            tracing::debug!(media_id = media.id, "Media already present");
            return Ok(EnsureOutcome {
                media,
                variants,
                created: false,
            });
        }

        let outcome = self.ingest(request, reader, cancel).await?;
        Ok(EnsureOutcome {
            media: outcome.media,
            variants: outcome.variants,
            created: true,
        })
    }

    /// Delete a media row (variant rows cascade) and then its files, best-effort.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, media_id: i64) -> Result<(), AppError> {
        let media = self.require_media(media_id).await?;
        let variants = self.store.list_variants(media_id).await?;

        if !self.store.delete_media(media_id).await? {
            return Err(AppError::NotFound(format!("Media {}", media_id)));
        }

        // Policy names too, so files orphaned by an earlier failed cleanup go as well.
        let mut variant_types: Vec<&str> =
            variants.iter().map(|v| v.variant_type.as_str()).collect();
        for name in self.policy.names() {
            if !variant_types.contains(&name) {
                variant_types.push(name);
            }
        }

        for key in StorageLayout::media_keys(media.uuid, &media.storage_filename, variant_types) {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(error = %e, key = %key, "Failed to delete stored file");
            }
        }

        tracing::info!(media_id, media_uuid = %media.uuid, "Media deleted");
        Ok(())
    }

    pub async fn get_media(&self, media_id: i64) -> Result<Media, AppError> {
        self.require_media(media_id).await
    }

    pub async fn list_variants(&self, media_id: i64) -> Result<Vec<MediaVariant>, AppError> {
        self.require_media(media_id).await?;
        self.store.list_variants(media_id).await
    }

    /// Newest first. `limit` is clamped to `1..=100`.
    pub async fn list_by_uploader(
        &self,
        uploaded_by: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Media>, AppError> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);
        self.store
            .list_media_by_uploader(uploaded_by, limit, offset.max(0))
            .await
    }

    /// Edit display metadata. Stored bytes and keys are never touched.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_metadata(
        &self,
        media_id: i64,
        mut update: MediaMetadataUpdate,
    ) -> Result<Media, AppError> {
        update.validate()?;
        if let Some(filename) = update.filename.take() {
            update.filename = Some(sanitize_filename(&filename)?);
        }

        if update.is_empty() {
            return self.require_media(media_id).await;
        }

        self.store
            .update_media_metadata(media_id, &update)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {}", media_id)))
    }

    /// Rebuild variants of an existing media from its stored original under the
    /// current policy. Existing rows are upserted; rows and files of variant types the
    /// policy no longer produces are removed.
    #[tracing::instrument(skip(self, cancel), fields(media_uuid = tracing::field::Empty))]
    pub async fn regenerate_variants(
        &self,
        media_id: i64,
        cancel: &CancellationToken,
    ) -> Result<IngestOutcome, AppError> {
        let start = Instant::now();
        let media = self.require_media(media_id).await?;
        tracing::Span::current().record("media_uuid", tracing::field::display(media.uuid));

        let existing: HashSet<String> = self
            .store
            .list_variants(media_id)
            .await?
            .into_iter()
            .map(|v| v.variant_type)
            .collect();

        let (mut report, produced): (VariantReport, HashSet<String>) = match media.dimensions() {
            Some((width, height)) => {
                let original_key =
                    StorageLayout::original_key(media.uuid, &media.storage_filename);
                let data = self.storage.read(&original_key).await?;
                let image = Arc::new(ImageProcessor::decode_blocking(data).await?);

                let produced: HashSet<String> = self
                    .policy
                    .plan(width, height)
                    .into_iter()
                    .filter_map(|p| match p {
                        VariantPlan::Render(spec) => Some(spec.name.clone()),
                        VariantPlan::Skip(..) => None,
                    })
                    .collect();
                let report = self
                    .generate_variants(&media, image, &existing, cancel)
                    .await;
                (report, produced)
            }
            None => (self.not_raster_report(), HashSet::new()),
        };

        for obsolete in existing.iter().filter(|t| !produced.contains(*t)) {
            // The file stays while its row does.
            if let Err(e) = self.store.delete_variant(media_id, obsolete).await {
                tracing::warn!(
                    error = %e,
                    variant = %obsolete,
                    "Failed to remove obsolete variant row"
                );
                report
                    .failures
                    .push(variant_failure(obsolete, FailureStage::Record, e.to_string()));
                continue;
            }
            let key = StorageLayout::variant_key(obsolete, media.uuid, &media.storage_filename);
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(error = %e, key = %key, "Failed to delete obsolete variant file");
            }
            tracing::info!(media_id, variant = %obsolete, "Obsolete variant removed");
        }

        tracing::info!(
            media_id,
            variants = report.variants.len(),
            failures = report.failures.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Variants regenerated"
        );

        Ok(IngestOutcome {
            media,
            variants: report.variants,
            failures: report.failures,
            skipped: report.skipped,
        })
    }

    async fn require_media(&self, media_id: i64) -> Result<Media, AppError> {
        self.store
            .get_media(media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media {}", media_id)))
    }

    /// Read, size-check and type-check an upload. `image/*` payloads must decode.
    async fn validate<R>(
        &self,
        request: &IngestRequest,
        reader: R,
    ) -> Result<ValidatedUpload, AppError>
    where
        R: AsyncRead + Send + Unpin,
    {
        let filename = self
            .validator
            .validate_request(&request.filename, &request.mime_type)?;
        let mime_type = normalize_content_type(&request.mime_type);

        // One byte past the limit is enough to know the upload is too large.
        let limit = self.validator.max_file_size() as u64 + 1;
        let mut data = Vec::new();
        reader
            .take(limit)
            .read_to_end(&mut data)
            .await
            .map_err(|e| AppError::InvalidInput(format!("Failed to read upload stream: {}", e)))?;
        self.validator.validate_file_size(data.len())?;

        let (data, image) = if mime_type.starts_with("image/") {
            // Decode now so undecodable images are rejected before anything is written.
            let (decoded, data) = tokio::task::spawn_blocking(move || {
                let decoded = ImageProcessor::decode(&data);
                (decoded, data)
            })
            .await
            .map_err(ProcessingError::from)?;
            (data, Some(Arc::new(decoded?)))
        } else {
            (data, None)
        };

        Ok(ValidatedUpload {
            filename,
            mime_type,
            data,
            image,
        })
    }

    fn not_raster_report(&self) -> VariantReport {
        VariantReport {
            skipped: self
                .policy
                .specs()
                .iter()
                .map(|spec| VariantSkip {
                    variant_type: spec.name.clone(),
                    reason: SkipReason::NotRaster,
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Run every policy entry for a decoded source. `existing` lists variant types that
    /// already have rows, whose files must survive a failed row upsert.
    async fn generate_variants(
        &self,
        media: &Media,
        source: Arc<DynamicImage>,
        existing: &HashSet<String>,
        cancel: &CancellationToken,
    ) -> VariantReport {
        let mut report = VariantReport::default();

        for plan in self.policy.plan(source.width(), source.height()) {
            match plan {
                VariantPlan::Skip(spec, reason) => {
                    tracing::debug!(variant = %spec.name, "Variant skipped");
                    report.skipped.push(VariantSkip {
                        variant_type: spec.name.clone(),
                        reason,
                    });
                }
                VariantPlan::Render(spec) => {
                    if cancel.is_cancelled() {
                        report.failures.push(variant_failure(
                            &spec.name,
                            FailureStage::Cancelled,
                            "ingestion cancelled before this variant was generated",
                        ));
                        continue;
                    }

                    let span = tracing::info_span!("variant", variant = %spec.name);
                    match self
                        .render_variant(media, &source, spec, existing.contains(&spec.name))
                        .instrument(span)
                        .await
                    {
                        Ok(variant) => report.variants.push(variant),
                        Err(failure) => {
                            tracing::warn!(
                                variant = %failure.variant_type,
                                stage = %failure.stage,
                                error = %failure.message,
                                "Variant failed"
                            );
                            report.failures.push(failure);
                        }
                    }
                }
            }
        }

        report
    }

    async fn render_variant(
        &self,
        media: &Media,
        source: &Arc<DynamicImage>,
        spec: &VariantSpec,
        had_row: bool,
    ) -> Result<MediaVariant, VariantFailure> {
        let start = Instant::now();
        let renderer = self.renderer.clone();
        let image = source.clone();
        let (target_width, target_height, crop) = (spec.width, spec.height, spec.crop);

        let rendered = tokio::task::spawn_blocking(move || {
            renderer.resize(&image, target_width, target_height, crop)
        })
        .await
        .map_err(|e| variant_failure(&spec.name, FailureStage::Resize, e.to_string()))?
        .map_err(|e| variant_failure(&spec.name, FailureStage::Resize, e.to_string()))?;

        let key = StorageLayout::variant_key(&spec.name, media.uuid, &media.storage_filename);
        self.storage
            .write(&key, &rendered.bytes)
            .await
            .map_err(|e| variant_failure(&spec.name, FailureStage::Write, e.to_string()))?;

        let new_variant = NewMediaVariant {
            media_id: media.id,
            variant_type: spec.name.clone(),
            width: rendered.width as i32,
            height: rendered.height as i32,
            size: rendered.bytes.len() as i64,
        };

        match self.store.create_variant(new_variant).await {
            Ok(variant) => {
                tracing::debug!(
                    width = variant.width,
                    height = variant.height,
                    size_bytes = variant.size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Variant stored"
                );
                Ok(variant)
            }
            Err(e) => {
                if !had_row {
                    if let Err(cleanup) = self.storage.delete(&key).await {
                        tracing::warn!(
                            error = %cleanup,
                            key = %key,
                            "Failed to remove variant file after row failure"
                        );
                    }
                }
                Err(variant_failure(&spec.name, FailureStage::Record, e.to_string()))
            }
        }
    }
}
