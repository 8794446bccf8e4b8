//! Folio Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every Folio component: the storage backends, the metadata store, the image
//! pipeline and the command-line tooling.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, MediaConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use storage_types::StorageBackend;
