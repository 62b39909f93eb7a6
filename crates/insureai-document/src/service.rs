//! Analysis service boundary and its mock backend.
//!
//! `MockAnalysisService` returns a fixed compliance report, but it first
//! sniffs the content against the declared format so the unreadable-content
//! path behaves like a real backend would.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use insureai_core::config::DocumentConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::{AnalysisReport, DocumentFormat, Issue, Severity, UploadedDocument};

/// Compliance analysis backend for the document flow.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(
        &self,
        document: &UploadedDocument,
        format: DocumentFormat,
    ) -> Result<AnalysisReport, ServiceError>;
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// Check that `content` plausibly is a `format` document.
pub fn sniff_content(content: &[u8], format: DocumentFormat) -> Result<(), ServiceError> {
    if content.is_empty() {
        return Err(ServiceError::MalformedContent("document is empty".into()));
    }
    let readable = match format {
        DocumentFormat::Pdf => content.starts_with(PDF_MAGIC),
        DocumentFormat::Docx => content.starts_with(ZIP_MAGIC),
        DocumentFormat::Doc => content.starts_with(OLE_MAGIC),
        DocumentFormat::Txt => match std::str::from_utf8(content) {
            Ok(text) => !text.trim().is_empty(),
            Err(_) => false,
        },
    };
    if readable {
        Ok(())
    } else {
        Err(ServiceError::MalformedContent(format!(
            "content is not a readable {} document",
            format
        )))
    }
}

/// The report every readable document receives from the mock.
pub fn mock_report() -> AnalysisReport {
    AnalysisReport {
        score: 85,
        issues: vec![
            Issue::new(
                Severity::High,
                "Missing required clause for liability coverage in section 3.2",
            ),
            Issue::new(
                Severity::Medium,
                "Premium calculation formula may not comply with state regulations",
            ),
            Issue::new(
                Severity::Low,
                "Consider updating beneficiary designation format",
            ),
        ],
        recommendations: vec![
            "Add comprehensive liability coverage clause with current state-mandated language"
                .to_string(),
            "Review premium calculation methodology with actuarial standards".to_string(),
            "Update beneficiary section to include contingent beneficiaries".to_string(),
            "Consider adding digital signature provisions for modern compliance".to_string(),
        ],
        summary: "Overall document structure is solid with good coverage terms. Primary concerns relate to liability coverage completeness and premium calculation compliance. Recommended changes would improve regulatory compliance and customer protection.".to_string(),
    }
}

/// Simulated backend: waits for `delay`, sniffs the content, then answers
/// with [`mock_report`].
pub struct MockAnalysisService {
    delay: Duration,
    failure: Option<ServiceError>,
    calls: AtomicUsize,
}

impl MockAnalysisService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(Duration::from_millis(config.analysis_delay_ms))
    }

    /// A mock that always fails with `error` after the delay.
    pub fn failing(delay: Duration, error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(delay)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalysisService for MockAnalysisService {
    async fn analyze(
        &self,
        document: &UploadedDocument,
        format: DocumentFormat,
    ) -> Result<AnalysisReport, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            document = %document.name,
            %format,
            bytes = document.content.len(),
            "Mock analysis request"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        sniff_content(&document.content, format)?;
        Ok(mock_report())
    }
}
