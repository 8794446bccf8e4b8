//! Key layout shared by every storage backend.
//!
//! Originals live under `originals/{uuid}/{filename}` and each variant under
//! `{variant}/{uuid}/{filename}`. The UUID is the only discriminator, so two uploads
//! with the same filename never collide and the display filename can change without
//! moving bytes.

use folio_core::models::ORIGINALS_ROOT;
use uuid::Uuid;

/// Builds storage keys for a media item.
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageLayout;

impl StorageLayout {
    /// Key of the stored original.
    pub fn original_key(uuid: Uuid, filename: &str) -> String {
        format!("{}/{}/{}", ORIGINALS_ROOT, uuid, filename)
    }

    /// Key of a named variant of the given media.
    pub fn variant_key(variant: &str, uuid: Uuid, filename: &str) -> String {
        format!("{}/{}/{}", variant, uuid, filename)
    }

    /// Original key followed by one key per variant type, in the given order.
    pub fn media_keys<'a, I>(uuid: Uuid, filename: &str, variants: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        std::iter::once(Self::original_key(uuid, filename))
            .chain(
                variants
                    .into_iter()
                    .map(|variant| Self::variant_key(variant, uuid, filename)),
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_uuid_namespaced() {
        let uuid = Uuid::parse_str("6f1c2b3a-0d4e-4f5a-8b6c-7d8e9f0a1b2c").unwrap();
        assert_eq!(
            StorageLayout::original_key(uuid, "beach.png"),
            "originals/6f1c2b3a-0d4e-4f5a-8b6c-7d8e9f0a1b2c/beach.png"
        );
        assert_eq!(
            StorageLayout::variant_key("thumbnail", uuid, "beach.png"),
            "thumbnail/6f1c2b3a-0d4e-4f5a-8b6c-7d8e9f0a1b2c/beach.png"
        );
    }

    #[test]
    fn same_filename_different_uuid_never_collides() {
        let a = StorageLayout::original_key(Uuid::new_v4(), "same.png");
        let b = StorageLayout::original_key(Uuid::new_v4(), "same.png");
        assert_ne!(a, b);
    }

    #[test]
    fn media_keys_start_with_original() {
        let uuid = Uuid::new_v4();
        let keys = StorageLayout::media_keys(uuid, "a.png", ["small", "large"]);
        assert_eq!(keys.len(), 3);
        assert!(keys[0].starts_with("originals/"));
        assert_eq!(keys[2], format!("large/{}/a.png", uuid));
    }
}
