//! Configuration module
//!
//! Configuration is read from the process environment (after loading `.env` if present).
//! Every setting has a default except `DATABASE_URL`.

use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use crate::models::VariantSpec;
use crate::storage_types::StorageBackend;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const UPLOADS_DIR: &str = "./uploads";
const ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/gif,image/webp,application/pdf";

/// Variant table applied when `VARIANT_POLICY` is unset. Order is processing order.
pub const DEFAULT_VARIANT_POLICY: &str =
    "thumbnail:150x150:crop,small:400x300:fit,medium:800x600:fit,large:1920x1080:fit";

/// Settings shared by every binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
}

/// Media pipeline configuration
#[derive(Clone, Debug)]
pub struct MediaConfig {
    pub base: BaseConfig,
    pub database_url: String,
    pub storage_backend: StorageBackend,
    pub uploads_dir: PathBuf,
    pub max_file_size_bytes: usize,
    pub allowed_content_types: Vec<String>,
    pub variant_policy: Vec<VariantSpec>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaConfig>);

impl Config {
    fn as_media(&self) -> &MediaConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_media().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_media().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> &str {
        &self.as_media().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_media().storage_backend
    }

    pub fn uploads_dir(&self) -> &std::path::Path {
        &self.as_media().uploads_dir
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_media().max_file_size_bytes
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_media().allowed_content_types
    }

    pub fn variant_policy(&self) -> &[VariantSpec] {
        &self.as_media().variant_policy
    }
}

impl MediaConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = BaseConfig {
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
        };

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::Local,
        };

        let max_file_size_mb = var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let allowed_content_types = var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|| ALLOWED_CONTENT_TYPES.to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let variant_policy = VariantSpec::parse_list(
            &var("VARIANT_POLICY").unwrap_or_else(|| DEFAULT_VARIANT_POLICY.to_string()),
        )?;

        let config = MediaConfig {
            base,
            database_url: var("FOLIO_DATABASE_URL")
                .or_else(|| var("DATABASE_URL"))
                .ok_or_else(|| anyhow::anyhow!("FOLIO_DATABASE_URL or DATABASE_URL must be set"))?,
            storage_backend,
            uploads_dir: PathBuf::from(
                var("UPLOADS_DIR").unwrap_or_else(|| UPLOADS_DIR.to_string()),
            ),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_content_types,
            variant_policy,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than zero"));
        }

        if self.variant_policy.is_empty() {
            return Err(anyhow::anyhow!("VARIANT_POLICY must contain at least one entry"));
        }

        let mut seen = HashSet::new();
        for spec in &self.variant_policy {
            spec.validate()?;
            if !seen.insert(spec.name.as_str()) {
                return Err(anyhow::anyhow!(
                    "VARIANT_POLICY contains duplicate variant '{}'",
                    spec.name
                ));
            }
        }

        Ok(())
    }
}
