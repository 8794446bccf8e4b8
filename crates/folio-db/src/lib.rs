//! Folio Database Layer
//!
//! Relational storage for media and variant rows: the [`MediaStore`] trait the
//! ingestion pipeline depends on, its Postgres implementation, and pool setup.

// Module declarations
pub mod db;
pub mod setup;
pub mod store;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-exports: repositories and store trait
pub use db::MediaRepository;
pub use store::MediaStore;

// Re-exports: Transaction utilities
pub use db::transaction::TransactionGuard;

// Re-exports: pool setup
pub use setup::{run_migrations, setup_database};

#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::InMemoryMediaStore;
