//! Database repositories for data access layer
//
// Media and variant rows
pub mod media;
//
// Transaction utilities
pub mod transaction;

pub use media::MediaRepository;
