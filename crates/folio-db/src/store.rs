//! Metadata store abstraction
//!
//! The ingestion pipeline only sees this trait, so it can run against Postgres in
//! production and against [`InMemoryMediaStore`](crate::test_helpers::InMemoryMediaStore)
//! in tests.

use async_trait::async_trait;
use folio_core::models::{Media, MediaMetadataUpdate, MediaVariant, NewMedia, NewMediaVariant};
use folio_core::AppError;

/// Relational store for media and variant rows.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Insert a media row. `storage_filename` is set from `filename`.
    async fn create_media(&self, media: NewMedia) -> Result<Media, AppError>;

    async fn get_media(&self, id: i64) -> Result<Option<Media>, AppError>;

    /// Oldest media of `uploaded_by` whose display filename equals `filename`.
    async fn find_media_by_filename(
        &self,
        uploaded_by: i64,
        filename: &str,
    ) -> Result<Option<Media>, AppError>;

    /// Media uploaded by `uploaded_by`, newest first.
    async fn list_media_by_uploader(
        &self,
        uploaded_by: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Media>, AppError>;

    async fn count_media(&self) -> Result<i64, AppError>;

    /// Apply a metadata edit. Returns `None` if the media does not exist.
    async fn update_media_metadata(
        &self,
        id: i64,
        update: &MediaMetadataUpdate,
    ) -> Result<Option<Media>, AppError>;

    /// Delete a media row and all its variant rows. Returns whether a row was removed.
    async fn delete_media(&self, id: i64) -> Result<bool, AppError>;

    /// Insert a variant row, replacing any existing row for the same `(media_id, type)`.
    async fn create_variant(&self, variant: NewMediaVariant) -> Result<MediaVariant, AppError>;

    /// Variants of a media, in insertion order.
    async fn list_variants(&self, media_id: i64) -> Result<Vec<MediaVariant>, AppError>;

    async fn count_variants(&self) -> Result<i64, AppError>;

    async fn delete_variant(&self, media_id: i64, variant_type: &str) -> Result<bool, AppError>;
}
