//! In-memory [`MediaStore`] for tests
//!
//! Mirrors the Postgres semantics the pipeline relies on: sequential ids, the
//! `(media_id, type)` upsert, and cascading deletes. Failure hooks let tests force
//! a media insert or a single variant insert to fail.

use async_trait::async_trait;
use chrono::Utc;
use folio_core::models::{Media, MediaMetadataUpdate, MediaVariant, NewMedia, NewMediaVariant};
use folio_core::AppError;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::store::MediaStore;

#[derive(Default)]
struct Tables {
    next_media_id: i64,
    next_variant_id: i64,
    media: BTreeMap<i64, Media>,
    variants: BTreeMap<i64, MediaVariant>,
}

/// Mock media store for testing without database
#[derive(Clone, Default)]
pub struct InMemoryMediaStore {
    tables: Arc<Mutex<Tables>>,
    fail_media_inserts: Arc<AtomicBool>,
    fail_variant_type: Arc<Mutex<Option<String>>>,
    fail_variant_deletes: Arc<AtomicBool>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `create_media` fail.
    pub fn fail_media_inserts(&self, fail: bool) {
        self.fail_media_inserts.store(fail, Ordering::SeqCst);
    }

    /// Make `create_variant` fail for the given variant type (or stop failing with `None`).
    pub fn fail_variant_type(&self, variant_type: Option<&str>) {
        *self.fail_variant_type.lock().unwrap() = variant_type.map(String::from);
    }

    /// Make every subsequent `delete_variant` fail.
    pub fn fail_variant_deletes(&self, fail: bool) {
        self.fail_variant_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn create_media(&self, media: NewMedia) -> Result<Media, AppError> {
        if self.fail_media_inserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected media insert failure".to_string()));
        }

        let mut tables = self.tables.lock().unwrap();
        if tables.media.values().any(|m| m.uuid == media.uuid) {
            return Err(AppError::InvalidInput(format!(
                "duplicate media uuid {}",
                media.uuid
            )));
        }

        tables.next_media_id += 1;
        let now = Utc::now();
        let row = Media {
            id: tables.next_media_id,
            uuid: media.uuid,
            storage_filename: media.filename.clone(),
            filename: media.filename,
            mime_type: media.mime_type,
            size: media.size,
            width: media.width,
            height: media.height,
            alt: media.alt,
            caption: media.caption,
            folder_id: media.folder_id,
            uploaded_by: media.uploaded_by,
            created_at: now,
            updated_at: now,
        };
        tables.media.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_media(&self, id: i64) -> Result<Option<Media>, AppError> {
        Ok(self.tables.lock().unwrap().media.get(&id).cloned())
    }

    async fn find_media_by_filename(
        &self,
        uploaded_by: i64,
        filename: &str,
    ) -> Result<Option<Media>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .media
            .values()
            .find(|m| m.uploaded_by == uploaded_by && m.filename == filename)
            .cloned())
    }

    async fn list_media_by_uploader(
        &self,
        uploaded_by: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Media>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .media
            .values()
            .rev()
            .filter(|m| m.uploaded_by == uploaded_by)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count_media(&self) -> Result<i64, AppError> {
        Ok(self.tables.lock().unwrap().media.len() as i64)
    }

    async fn update_media_metadata(
        &self,
        id: i64,
        update: &MediaMetadataUpdate,
    ) -> Result<Option<Media>, AppError> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.media.get_mut(&id).map(|media| {
            update.apply_to(media, Utc::now());
            media.clone()
        }))
    }

    async fn delete_media(&self, id: i64) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().unwrap();
        let removed = tables.media.remove(&id).is_some();
        if removed {
            tables.variants.retain(|_, v| v.media_id != id);
        }
        Ok(removed)
    }

    async fn create_variant(&self, variant: NewMediaVariant) -> Result<MediaVariant, AppError> {
        if self.fail_variant_type.lock().unwrap().as_deref() == Some(variant.variant_type.as_str())
        {
            return Err(AppError::Internal(format!(
                "injected variant insert failure for {}",
                variant.variant_type
            )));
        }

        let mut tables = self.tables.lock().unwrap();
        if !tables.media.contains_key(&variant.media_id) {
            return Err(AppError::InvalidInput(format!(
                "media {} does not exist",
                variant.media_id
            )));
        }

        let existing = tables
            .variants
            .values()
            .find(|v| v.media_id == variant.media_id && v.variant_type == variant.variant_type)
            .map(|v| v.id);

        let id = match existing {
            Some(id) => id,
            None => {
                tables.next_variant_id += 1;
                tables.next_variant_id
            }
        };

        let row = MediaVariant {
            id,
            media_id: variant.media_id,
            variant_type: variant.variant_type,
            width: variant.width,
            height: variant.height,
            size: variant.size,
            created_at: Utc::now(),
        };
        tables.variants.insert(id, row.clone());
        Ok(row)
    }

    async fn list_variants(&self, media_id: i64) -> Result<Vec<MediaVariant>, AppError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .variants
            .values()
            .filter(|v| v.media_id == media_id)
            .cloned()
            .collect())
    }

    async fn count_variants(&self) -> Result<i64, AppError> {
        Ok(self.tables.lock().unwrap().variants.len() as i64)
    }

    async fn delete_variant(&self, media_id: i64, variant_type: &str) -> Result<bool, AppError> {
        if self.fail_variant_deletes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(format!(
                "injected variant delete failure for {}",
                variant_type
            )));
        }

        let mut tables = self.tables.lock().unwrap();
        let before = tables.variants.len();
        tables
            .variants
            .retain(|_, v| !(v.media_id == media_id && v.variant_type == variant_type));
        Ok(tables.variants.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn new_media(filename: &str, uploaded_by: i64) -> NewMedia {
        NewMedia {
            uuid: Uuid::new_v4(),
            filename: filename.to_string(),
            mime_type: "image/png".to_string(),
            size: 10,
            width: Some(10),
            height: Some(10),
            alt: None,
            caption: None,
            folder_id: None,
            uploaded_by,
        }
    }

    fn new_variant(media_id: i64, variant_type: &str, width: i32) -> NewMediaVariant {
        NewMediaVariant {
            media_id,
            variant_type: variant_type.to_string(),
            width,
            height: width,
            size: 5,
        }
    }

    #[tokio::test]
    async fn variant_upsert_keeps_one_row_per_type() {
        let store = InMemoryMediaStore::new();
        let media = store.create_media(new_media("a.png", 1)).await.unwrap();

        let first = store.create_variant(new_variant(media.id, "small", 100)).await.unwrap();
        let second = store.create_variant(new_variant(media.id, "small", 200)).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(store.count_variants().await.unwrap(), 1);
        assert_eq!(store.list_variants(media.id).await.unwrap()[0].width, 200);
    }

    #[tokio::test]
    async fn delete_media_cascades_to_variants() {
        let store = InMemoryMediaStore::new();
        let media = store.create_media(new_media("a.png", 1)).await.unwrap();
        store.create_variant(new_variant(media.id, "small", 100)).await.unwrap();

        assert!(store.delete_media(media.id).await.unwrap());
        assert!(!store.delete_media(media.id).await.unwrap());
        assert_eq!(store.count_variants().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failure_hooks_only_hit_their_target() {
        let store = InMemoryMediaStore::new();
        let media = store.create_media(new_media("a.png", 1)).await.unwrap();

        store.fail_variant_type(Some("large"));
        assert!(store.create_variant(new_variant(media.id, "large", 1)).await.is_err());
        assert!(store.create_variant(new_variant(media.id, "small", 1)).await.is_ok());

        store.fail_media_inserts(true);
        assert!(store.create_media(new_media("b.png", 1)).await.is_err());
        assert_eq!(store.count_media().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_by_uploader_is_newest_first_and_paged() {
        let store = InMemoryMediaStore::new();
        for name in ["a.png", "b.png", "c.png"] {
            store.create_media(new_media(name, 7)).await.unwrap();
        }
        store.create_media(new_media("other.png", 8)).await.unwrap();

        let page = store.list_media_by_uploader(7, 2, 0).await.unwrap();
        let names: Vec<&str> = page.iter().map(|m| m.filename.as_str()).collect();
        assert_eq!(names, vec!["c.png", "b.png"]);

        let rest = store.list_media_by_uploader(7, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].filename, "a.png");
    }
}
