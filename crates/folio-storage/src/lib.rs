//! Folio Storage Library
//!
//! Byte storage for originals and their variants, behind the [`Storage`] trait.
//!
//! # Storage key format
//!
//! Every backend uses the same UUID-namespaced layout, built by [`StorageLayout`]:
//!
//! - **Originals**: `originals/{uuid}/{filename}`
//! - **Variants**: `{variant}/{uuid}/{filename}`
//!
//! Keys must not contain `..` or a leading `/`.

pub mod factory;
pub mod layout;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use folio_core::StorageBackend;
pub use layout::StorageLayout;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
