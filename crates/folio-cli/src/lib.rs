//! Shared helpers for the `folio` binary.

use anyhow::Context;
use folio_core::Config;
use folio_db::{setup_database, MediaRepository};
use folio_processing::{
    guess_content_type, ImageResizer, IngestLimits, IngestionService, VariantPolicy,
};
use folio_storage::create_storage;
use std::sync::Arc;

/// Content type used when a file's extension tells us nothing.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Connect to Postgres (migrations included), open storage and wire the ingestion service.
pub async fn build_service(config: &Config) -> anyhow::Result<IngestionService> {
    let pool = setup_database(config)
        .await
        .context("Failed to set up the database")?;

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    let policy = VariantPolicy::from_config(config)?;

    tracing::info!(
        storage = %storage.backend_type(),
        variants = policy.len(),
        "Ingestion service ready"
    );

    Ok(IngestionService::new(
        storage,
        Arc::new(MediaRepository::new(pool)),
        Arc::new(ImageResizer),
        policy,
        IngestLimits::from_config(config),
    ))
}

/// MIME type for a path, from its extension.
pub fn content_type_for(filename: &str) -> &'static str {
    guess_content_type(filename).unwrap_or(FALLBACK_CONTENT_TYPE)
}

/// Truncate a string to `max_len` characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
