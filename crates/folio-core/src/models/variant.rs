use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::OnceLock;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Storage root reserved for originals; no variant may use this name.
pub const ORIGINALS_ROOT: &str = "originals";

fn variant_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9_-]{1,64}$").expect("valid variant name regex"))
}

/// One derived rendition of a media original, keyed by `(media_id, variant_type)`.
///
/// `width`/`height` are the dimensions actually produced, which for fit policies
/// usually differ from the policy's nominal target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
pub struct MediaVariant {
    pub id: i64,
    pub media_id: i64,
    #[serde(rename = "type")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "type"))]
    pub variant_type: String,
    pub width: i32,
    pub height: i32,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMediaVariant {
    pub media_id: i64,
    pub variant_type: String,
    pub width: i32,
    pub height: i32,
    pub size: i64,
}

/// A named sizing policy applied to every ingested raster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub crop: bool,
}

impl VariantSpec {
    pub fn new(name: impl Into<String>, width: u32, height: u32, crop: bool) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            crop,
        }
    }

    /// Parse a single entry in `name:WxH[:crop|:fit]` form. The mode defaults to fit.
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        let parts: Vec<&str> = s.trim().split(':').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(anyhow::anyhow!(
                "Invalid variant spec '{}'. Expected: name:WxH[:crop|fit]",
                s
            ));
        }

        let name = parts[0].trim().to_lowercase();
        let (w, h) = parts[1]
            .trim()
            .split_once('x')
            .ok_or_else(|| anyhow::anyhow!("Invalid dimensions in variant spec '{}'", s))?;
        let width = w
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid width in variant spec '{}'", s))?;
        let height = h
            .parse::<u32>()
            .map_err(|_| anyhow::anyhow!("Invalid height in variant spec '{}'", s))?;
        let crop = match parts.get(2).map(|m| m.trim().to_lowercase()) {
            None => false,
            Some(m) if m == "fit" => false,
            Some(m) if m == "crop" || m == "fill" => true,
            Some(m) => {
                return Err(anyhow::anyhow!(
                    "Invalid resize mode '{}' in variant spec '{}'",
                    m,
                    s
                ))
            }
        };

        let spec = VariantSpec {
            name,
            width,
            height,
            crop,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a comma-separated list of entries, preserving order.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, anyhow::Error> {
        s.split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(VariantSpec::parse)
            .collect()
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !variant_name_pattern().is_match(&self.name) {
            return Err(anyhow::anyhow!(
                "Variant name '{}' must match [a-z0-9_-]{{1,64}}",
                self.name
            ));
        }
        if self.name == ORIGINALS_ROOT {
            return Err(anyhow::anyhow!(
                "Variant name '{}' is reserved for originals",
                ORIGINALS_ROOT
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(anyhow::anyhow!(
                "Variant '{}' must have non-zero dimensions",
                self.name
            ));
        }
        Ok(())
    }
}

impl Display for VariantSpec {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let mode = if self.crop { "crop" } else { "fit" };
        write!(f, "{}:{}x{}:{}", self.name, self.width, self.height, mode)
    }
}

/// Stage of the per-variant job at which it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Resize,
    Write,
    Record,
    Cancelled,
}

impl Display for FailureStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FailureStage::Resize => write!(f, "resize"),
            FailureStage::Write => write!(f, "write"),
            FailureStage::Record => write!(f, "record"),
            FailureStage::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A variant that was attempted and did not survive. Never aborts ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantFailure {
    pub variant_type: String,
    pub stage: FailureStage,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The source already fits inside a fit-policy's bounds.
    SourceWithinBounds { width: u32, height: u32 },
    /// The media has no pixel dimensions (documents and other non-raster types).
    NotRaster,
}

/// A variant intentionally not produced. Not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSkip {
    pub variant_type: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_crop_and_fit_entries() {
        let thumb = VariantSpec::parse("thumbnail:150x150:crop").unwrap();
        assert_eq!(thumb, VariantSpec::new("thumbnail", 150, 150, true));

        let small = VariantSpec::parse("small:400x300").unwrap();
        assert!(!small.crop);
        assert_eq!(small.to_string(), "small:400x300:fit");
    }

    #[test]
    fn parse_list_preserves_order() {
        let specs =
            VariantSpec::parse_list("thumbnail:150x150:crop, small:400x300:fit,large:1920x1080")
                .unwrap();
        let names: Vec<&str> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["thumbnail", "small", "large"]);
    }

    #[test]
    fn parse_rejects_bad_entries() {
        assert!(VariantSpec::parse("thumbnail").is_err());
        assert!(VariantSpec::parse("thumbnail:150").is_err());
        assert!(VariantSpec::parse("thumbnail:0x150:crop").is_err());
        assert!(VariantSpec::parse("thumbnail:150x150:stretch").is_err());
        assert!(VariantSpec::parse("originals:150x150").is_err());
        assert!(VariantSpec::parse("../etc:150x150").is_err());
    }
}
