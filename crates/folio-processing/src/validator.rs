use folio_core::AppError;
use std::path::Path;

const MAX_FILENAME_LEN: usize = 255;

/// Common validation errors for uploads
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { size, max } => AppError::PayloadTooLarge { size, max },
            ValidationError::InvalidContentType { .. } => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            ValidationError::InvalidFilename(_) | ValidationError::EmptyFile => {
                AppError::InvalidInput(err.to_string())
            }
        }
    }
}

/// Reduce an uploaded filename to a safe storage leaf.
///
/// Keeps only the basename, rejects anything containing `..`, and replaces every
/// character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(filename: &str) -> Result<String, ValidationError> {
    let path = Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    let sanitized: String = base
        .chars()
        .take(MAX_FILENAME_LEN)
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '_' || c == '.') {
        return Err(ValidationError::InvalidFilename(filename.to_string()));
    }

    Ok(sanitized)
}

/// Normalize a MIME type: lowercase, parameters stripped (`image/PNG; q=1` -> `image/png`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Content types a file extension is expected to carry, for the extensions we know.
pub fn expected_content_types(extension: &str) -> Option<&'static [&'static str]> {
    let types: &'static [&'static str] = match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => &["image/jpeg"],
        "png" => &["image/png"],
        "gif" => &["image/gif"],
        "webp" => &["image/webp"],
        "pdf" => &["application/pdf"],
        "txt" => &["text/plain"],
        "csv" => &["text/csv"],
        _ => return None,
    };
    Some(types)
}

/// Best-effort MIME type from a filename's extension.
pub fn guess_content_type(filename: &str) -> Option<&'static str> {
    let extension = Path::new(filename).extension()?.to_str()?;
    expected_content_types(extension).and_then(|types| types.first().copied())
}

/// Upload validator
///
/// Checks size, declared content type, and the filename/extension pair, without
/// knowing anything about storage.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    max_file_size: usize,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(max_file_size: usize, allowed_content_types: Vec<String>) -> Self {
        Self {
            max_file_size,
            allowed_content_types: allowed_content_types
                .iter()
                .map(|ct| normalize_content_type(ct))
                .collect(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate content type against the allow-list
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that the content type matches the file extension.
    /// Filenames without an extension, or with one we don't know, are accepted.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let Some(extension) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
            return Ok(());
        };

        let Some(expected) = expected_content_types(extension) else {
            tracing::debug!(
                extension = %extension,
                content_type = %content_type,
                "Unknown extension, skipping content type/extension cross-validation"
            );
            return Ok(());
        };

        let normalized = normalize_content_type(content_type);
        if !expected.iter().any(|ct| *ct == normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected.join(", ")
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate everything except the payload bytes and return the sanitized filename.
    pub fn validate_request(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<String, ValidationError> {
        let sanitized = sanitize_filename(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(&sanitized, content_type)?;
        Ok(sanitized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> MediaValidator {
        MediaValidator::new(
            1024 * 1024, // 1MB
            vec!["image/jpeg".to_string(), "image/png".to_string()],
        )
    }

    #[test]
    fn test_validate_file_size() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
        assert!(matches!(
            validator.validate_file_size(2 * 1024 * 1024),
            Err(ValidationError::FileTooLarge { .. })
        ));
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_content_type() {
        let validator = test_validator();
        assert!(validator.validate_content_type("image/jpeg").is_ok());
        assert!(validator.validate_content_type("IMAGE/PNG").is_ok());
        assert!(validator.validate_content_type("image/png; charset=binary").is_ok());
        assert!(validator.validate_content_type("image/gif").is_err());
    }

    #[test]
    fn test_validate_extension_content_type_match() {
        let validator = test_validator();
        assert!(validator
            .validate_extension_content_type_match("test.jpg", "image/jpeg")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("test.jpg", "image/png")
            .is_err());
        assert!(validator
            .validate_extension_content_type_match("no_extension", "image/png")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("scan.tiff", "image/png")
            .is_ok());
    }

    #[test]
    fn test_sanitize_filename_keeps_basename() {
        assert_eq!(sanitize_filename("beach.png").unwrap(), "beach.png");
        assert_eq!(sanitize_filename("/tmp/uploads/beach.png").unwrap(), "beach.png");
        assert_eq!(sanitize_filename("my photo (1).jpg").unwrap(), "my_photo__1_.jpg");
    }

    #[test]
    fn test_sanitize_filename_rejects_traversal_and_empty() {
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("..\\..\\evil.png").is_err());
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("???").is_err());
    }

    #[test]
    fn test_validate_request_returns_sanitized_name() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_request("dir/café.png", "image/png").unwrap(),
            "caf_.png"
        );
        assert!(matches!(
            validator.validate_request("a.png", "application/pdf"),
            Err(ValidationError::InvalidContentType { .. })
        ));
    }

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type("a.JPG"), Some("image/jpeg"));
        assert_eq!(guess_content_type("doc.pdf"), Some("application/pdf"));
        assert_eq!(guess_content_type("archive.tar"), None);
        assert_eq!(guess_content_type("README"), None);
    }

    #[test]
    fn test_validation_error_maps_to_app_error() {
        let err: AppError = ValidationError::FileTooLarge { size: 10, max: 5 }.into();
        assert!(matches!(err, AppError::PayloadTooLarge { size: 10, max: 5 }));

        let err: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }
}
