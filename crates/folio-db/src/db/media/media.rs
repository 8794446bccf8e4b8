use async_trait::async_trait;
use folio_core::models::{Media, MediaMetadataUpdate, MediaVariant, NewMedia, NewMediaVariant};
use folio_core::AppError;
use sqlx::{PgPool, Postgres};

use crate::db::transaction::TransactionGuard;
use crate::store::MediaStore;

const MEDIA_COLUMNS: &str = "id, uuid, filename, storage_filename, mime_type, size, width, height, \
     alt, caption, folder_id, uploaded_by, created_at, updated_at";

const VARIANT_COLUMNS: &str = "id, media_id, type, width, height, size, created_at";

/// Postgres-backed media and variant repository
#[derive(Clone)]
pub struct MediaRepository {
    pool: PgPool,
}

impl MediaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MediaStore for MediaRepository {
    #[tracing::instrument(skip(self, media), fields(db.table = "media", db.operation = "insert", media_uuid = %media.uuid))]
    async fn create_media(&self, media: NewMedia) -> Result<Media, AppError> {
        let query = format!(
            r#"
            INSERT INTO media (uuid, filename, storage_filename, mime_type, size, width, height,
                               alt, caption, folder_id, uploaded_by)
            VALUES ($1, $2, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            MEDIA_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, Media>(&query)
            .bind(media.uuid)
            .bind(&media.filename)
            .bind(&media.mime_type)
            .bind(media.size)
            .bind(media.width)
            .bind(media.height)
            .bind(&media.alt)
            .bind(&media.caption)
            .bind(media.folder_id)
            .bind(media.uploaded_by)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select", db.record_id = id))]
    async fn get_media(&self, id: i64) -> Result<Option<Media>, AppError> {
        let query = format!("SELECT {} FROM media WHERE id = $1", MEDIA_COLUMNS);
        let row = sqlx::query_as::<Postgres, Media>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn find_media_by_filename(
        &self,
        uploaded_by: i64,
        filename: &str,
    ) -> Result<Option<Media>, AppError> {
        let query = format!(
            "SELECT {} FROM media WHERE uploaded_by = $1 AND filename = $2 ORDER BY id ASC LIMIT 1",
            MEDIA_COLUMNS
        );
        let row = sqlx::query_as::<Postgres, Media>(&query)
            .bind(uploaded_by)
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "select"))]
    async fn list_media_by_uploader(
        &self,
        uploaded_by: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Media>, AppError> {
        let query = format!(
            "SELECT {} FROM media WHERE uploaded_by = $1 ORDER BY id DESC LIMIT $2 OFFSET $3",
            MEDIA_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, Media>(&query)
            .bind(uploaded_by)
            .bind(limit.max(0))
            .bind(offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "count"))]
    async fn count_media(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "media", db.operation = "update", db.record_id = id))]
    async fn update_media_metadata(
        &self,
        id: i64,
        update: &MediaMetadataUpdate,
    ) -> Result<Option<Media>, AppError> {
        // Build update query from the fields actually present
        let mut query = String::from("UPDATE media SET updated_at = NOW()");
        let mut bind_index = 1;

        if update.filename.is_some() {
            query.push_str(&format!(", filename = ${}", bind_index));
            bind_index += 1;
        }
        if update.alt.is_some() {
            query.push_str(&format!(", alt = ${}", bind_index));
            bind_index += 1;
        }
        if update.caption.is_some() {
            query.push_str(&format!(", caption = ${}", bind_index));
            bind_index += 1;
        }
        if update.folder_id.is_some() {
            query.push_str(&format!(", folder_id = ${}", bind_index));
            bind_index += 1;
        }

        query.push_str(&format!(
            " WHERE id = ${} RETURNING {}",
            bind_index, MEDIA_COLUMNS
        ));

        let mut query_builder = sqlx::query_as::<Postgres, Media>(&query);
        if let Some(filename) = &update.filename {
            query_builder = query_builder.bind(filename);
        }
        if let Some(alt) = &update.alt {
            query_builder = query_builder.bind(alt);
        }
        if let Some(caption) = &update.caption {
            query_builder = query_builder.bind(caption);
        }
        if let Some(folder_id) = update.folder_id {
            query_builder = query_builder.bind(folder_id);
        }
        query_builder = query_builder.bind(id);

        let row = query_builder.fetch_optional(&self.pool).await?;
        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media", db.operation = "delete", db.record_id = id))]
    async fn delete_media(&self, id: i64) -> Result<bool, AppError> {
        let mut tx = TransactionGuard::begin(&self.pool).await?;

        // The FK cascades too; deleting explicitly keeps the count in the log.
        let variants_removed = sqlx::query("DELETE FROM media_variant WHERE media_id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        let rows_affected = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::debug!(
            media_id = id,
            variants_removed = variants_removed,
            "Media row deleted"
        );

        Ok(rows_affected > 0)
    }

    #[tracing::instrument(skip(self, variant), fields(db.table = "media_variant", db.operation = "upsert", media_id = variant.media_id, variant = %variant.variant_type))]
    async fn create_variant(&self, variant: NewMediaVariant) -> Result<MediaVariant, AppError> {
        let query = format!(
            r#"
            INSERT INTO media_variant (media_id, type, width, height, size)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (media_id, type) DO UPDATE
                SET width = EXCLUDED.width,
                    height = EXCLUDED.height,
                    size = EXCLUDED.size,
                    created_at = NOW()
            RETURNING {}
            "#,
            VARIANT_COLUMNS
        );

        let row = sqlx::query_as::<Postgres, MediaVariant>(&query)
            .bind(variant.media_id)
            .bind(&variant.variant_type)
            .bind(variant.width)
            .bind(variant.height)
            .bind(variant.size)
            .fetch_one(&self.pool)
            .await?;

        Ok(row)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_variant", db.operation = "select", media_id = media_id))]
    async fn list_variants(&self, media_id: i64) -> Result<Vec<MediaVariant>, AppError> {
        let query = format!(
            "SELECT {} FROM media_variant WHERE media_id = $1 ORDER BY id ASC",
            VARIANT_COLUMNS
        );
        let rows = sqlx::query_as::<Postgres, MediaVariant>(&query)
            .bind(media_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_variant", db.operation = "count"))]
    async fn count_variants(&self) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM media_variant")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[tracing::instrument(skip(self), fields(db.table = "media_variant", db.operation = "delete", media_id = media_id))]
    async fn delete_variant(&self, media_id: i64, variant_type: &str) -> Result<bool, AppError> {
        let rows_affected =
            sqlx::query("DELETE FROM media_variant WHERE media_id = $1 AND type = $2")
                .bind(media_id)
                .bind(variant_type)
                .execute(&self.pool)
                .await?
                .rows_affected();

        Ok(rows_affected > 0)
    }
}
