use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// One ingested original and its metadata.
///
/// `uuid` is assigned once at ingestion and keys every stored file of this media.
/// `filename` is the editable display name; `storage_filename` is the leaf the bytes
/// were written under and never changes, so renaming does not orphan files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct Media {
    pub id: i64,
    pub uuid: Uuid,
    pub filename: String,
    pub storage_filename: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub folder_id: Option<i64>,
    pub uploaded_by: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Media {
    /// Pixel dimensions, present only for raster media.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w as u32, h as u32)),
            _ => None,
        }
    }

    pub fn is_raster(&self) -> bool {
        self.dimensions().is_some()
    }
}

/// Insert payload for a media row. The store assigns `id` and timestamps.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub uuid: Uuid,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub folder_id: Option<i64>,
    pub uploaded_by: i64,
}

/// Metadata edit. Never touches stored bytes.
///
/// `Option<Option<_>>` distinguishes "leave unchanged" (`None`) from "clear"
/// (`Some(None)`).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MediaMetadataUpdate {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 255,
        message = "Filename must be between 1 and 255 characters"
    ))]
    pub filename: Option<String>,
    #[serde(default)]
    pub alt: Option<Option<String>>,
    #[serde(default)]
    pub caption: Option<Option<String>>,
    #[serde(default)]
    pub folder_id: Option<Option<i64>>,
}

impl MediaMetadataUpdate {
    pub fn is_empty(&self) -> bool {
        self.filename.is_none()
            && self.alt.is_none()
            && self.caption.is_none()
            && self.folder_id.is_none()
    }

    /// Apply this edit to an in-memory record, bumping `updated_at`.
    pub fn apply_to(&self, media: &mut Media, now: DateTime<Utc>) {
        if let Some(filename) = &self.filename {
            media.filename = filename.clone();
        }
        if let Some(alt) = &self.alt {
            media.alt = alt.clone();
        }
        if let Some(caption) = &self.caption {
            media.caption = caption.clone();
        }
        if let Some(folder_id) = self.folder_id {
            media.folder_id = folder_id;
        }
        media.updated_at = now;
    }
}
