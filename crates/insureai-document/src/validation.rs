//! Client-side checks that must pass before a document is submitted.

use insureai_core::config::DocumentConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::{DocumentFormat, UploadedDocument};

/// Enforces the upload page's accepted formats and size limit.
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    max_bytes: u64,
    allowed: Vec<DocumentFormat>,
}

impl DocumentValidator {
    pub fn new(max_bytes: u64, allowed: Vec<DocumentFormat>) -> Self {
        Self { max_bytes, allowed }
    }

    /// Build from config. Unknown extensions in `allowed_extensions` are skipped.
    pub fn from_config(config: &DocumentConfig) -> Self {
        let allowed = config
            .allowed_extensions
            .iter()
            .filter_map(|ext| {
                let format = DocumentFormat::from_extension(ext.trim_start_matches('.'));
                if format.is_none() {
                    tracing::warn!(extension = %ext, "Ignoring unknown allowed extension");
                }
                format
            })
            .collect();
        Self::new(config.max_upload_bytes, allowed)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Resolve the document's declared format and check its size.
    ///
    /// The larger of the declared size and the actual content length is
    /// compared against the limit.
    pub fn validate(&self, document: &UploadedDocument) -> Result<DocumentFormat, ServiceError> {
        let format = document
            .extension()
            .and_then(DocumentFormat::from_extension)
            .filter(|f| self.allowed.contains(f))
            .ok_or_else(|| {
                ServiceError::UnsupportedFormat(
                    document
                        .extension()
                        .map(|e| format!(".{}", e.to_ascii_lowercase()))
                        .unwrap_or_else(|| document.name.clone()),
                )
            })?;

        let size = document.byte_size.max(document.content.len() as u64);
        if size > self.max_bytes {
            return Err(ServiceError::SizeExceeded {
                size,
                limit: self.max_bytes,
            });
        }

        Ok(format)
    }
}

impl Default for DocumentValidator {
    fn default() -> Self {
        Self::from_config(&DocumentConfig::default())
    }
}
