use serde::Serialize;

use super::media::Media;
use super::variant::{MediaVariant, VariantFailure, VariantSkip};

/// Result of one successful ingestion (or regeneration).
///
/// Success means the original and its media row exist. `variants` holds only the
/// renditions that were written and recorded; callers that need every policy entry
/// present must compare against the policy themselves.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub media: Media,
    pub variants: Vec<MediaVariant>,
    pub failures: Vec<VariantFailure>,
    pub skipped: Vec<VariantSkip>,
}

impl IngestOutcome {
    pub fn variant(&self, variant_type: &str) -> Option<&MediaVariant> {
        self.variants
            .iter()
            .find(|v| v.variant_type == variant_type)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A file in a batch that failed fatally.
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    /// Position of the file in the submitted batch.
    pub index: usize,
    pub filename: String,
    pub error_code: &'static str,
    pub message: String,
}

/// Result of a batch ingestion where at least one file succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<IngestOutcome>,
    pub failed: Vec<FileFailure>,
}

/// Result of an idempotent "ensure present" ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct EnsureOutcome {
    pub media: Media,
    pub variants: Vec<MediaVariant>,
    /// `false` when existing records were returned and nothing was written.
    pub created: bool,
}
