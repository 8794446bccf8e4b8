//! Data models for the ingestion pipeline
//!
//! Media and variant rows as persisted by the metadata store, the static variant
//! policy entries, and the outcome types returned by ingestion.

mod media;
mod outcome;
mod variant;

pub use media::{Media, MediaMetadataUpdate, NewMedia};
pub use outcome::{BatchOutcome, EnsureOutcome, FileFailure, IngestOutcome};
pub use variant::{
    FailureStage, MediaVariant, NewMediaVariant, SkipReason, VariantFailure, VariantSkip,
    VariantSpec, ORIGINALS_ROOT,
};
