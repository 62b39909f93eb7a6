//! Document analysis flow: one selected file, one pending request, one report.
//!
//! Format and size are validated when a file is selected and again at
//! submission, so a rejected file never reaches the analysis service. A
//! report always belongs to the most recently submitted document and is
//! replaced by the next successful analysis. `reset` clears everything and
//! bumps the session epoch, so a late report from before the reset is
//! dropped on arrival.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use insureai_core::config::DocumentConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::{AnalysisReport, DocumentFormat, UploadedDocument, MAX_SCORE};

use crate::error::DocumentError;
use crate::service::AnalysisService;
use crate::validation::DocumentValidator;

/// The report currently on display and the document it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveReport {
    pub document_name: String,
    pub format: DocumentFormat,
    pub report: AnalysisReport,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Completed(ActiveReport),
    /// The flow was reset while the analysis was in flight.
    Discarded,
}

/// Which view of the upload page applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentPhase {
    /// Nothing selected: show the drop zone.
    Empty,
    /// A file is selected and ready to analyse.
    Selected,
    Analyzing,
    /// A report is available.
    Reported,
}

struct FlowState {
    selected: Option<UploadedDocument>,
    report: Option<ActiveReport>,
    pending: bool,
    epoch: u64,
    last_error: Option<ServiceError>,
}

impl FlowState {
    fn empty(epoch: u64) -> Self {
        Self {
            selected: None,
            report: None,
            pending: false,
            epoch,
            last_error: None,
        }
    }
}

struct InFlight<'a> {
    state: &'a Mutex<FlowState>,
    epoch: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            if state.epoch == self.epoch && state.pending {
                tracing::debug!(epoch = self.epoch, "Analysis request abandoned");
                state.pending = false;
            }
        }
    }
}

/// One upload session driving an [`AnalysisService`].
pub struct DocumentFlow {
    service: Arc<dyn AnalysisService>,
    validator: DocumentValidator,
    request_timeout_secs: u64,
    state: Mutex<FlowState>,
}

impl DocumentFlow {
    pub fn new(service: Arc<dyn AnalysisService>, config: &DocumentConfig) -> Self {
        Self {
            service,
            validator: DocumentValidator::from_config(config),
            request_timeout_secs: config.request_timeout_secs,
            state: Mutex::new(FlowState::empty(0)),
        }
    }

    pub fn validator(&self) -> &DocumentValidator {
        &self.validator
    }

    /// Select a document for analysis.
    ///
    /// A rejected document leaves the current selection untouched and is
    /// recorded as the flow's last error. An accepted one replaces the
    /// selection and clears any report from an earlier document.
    pub fn select(&self, document: UploadedDocument) -> Result<DocumentFormat, DocumentError> {
        let mut state = self.lock()?;
        if state.pending {
            return Err(DocumentError::AnalysisPending);
        }

        match self.validator.validate(&document) {
            Ok(format) => {
                tracing::info!(
                    document = %document.name,
                    size = %document.size_label(),
                    %format,
                    "Document selected"
                );
                state.selected = Some(document);
                state.report = None;
                state.last_error = None;
                Ok(format)
            }
            Err(err) => {
                tracing::info!(document = %document.name, error = %err, "Document rejected");
                state.last_error = Some(err.clone());
                Err(DocumentError::Rejected(err))
            }
        }
    }

    /// Send the selected document to the analysis service.
    pub async fn submit(&self) -> Result<AnalysisOutcome, DocumentError> {
        let (document, format, epoch) = {
            let mut state = self.lock()?;
            if state.pending {
                return Err(DocumentError::AnalysisPending);
            }
            let document = state
                .selected
                .clone()
                .ok_or(DocumentError::NoDocumentSelected)?;
            let format = self
                .validator
                .validate(&document)
                .map_err(DocumentError::Rejected)?;
            state.pending = true;
            state.last_error = None;
            (document, format, state.epoch)
        };

        tracing::info!(document = %document.name, epoch, "Analysis started");

        let mut in_flight = InFlight {
            state: &self.state,
            epoch,
            settled: false,
        };

        let limit = self.request_timeout_secs;
        let request = self.service.analyze(&document, format);
        let result = if limit == 0 {
            request.await
        } else {
            match tokio::time::timeout(Duration::from_secs(limit), request).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(limit)),
            }
        };

        in_flight.settled = true;
        self.settle(epoch, document.name, format, result)
    }

    /// Clear the selection, the report and any error ("process another").
    ///
    /// An in-flight analysis keeps running; its report is discarded on arrival.
    pub fn reset(&self) -> Result<(), DocumentError> {
        let mut state = self.lock()?;
        let epoch = state.epoch + 1;
        *state = FlowState::empty(epoch);
        tracing::info!(epoch, "Document flow reset");
        Ok(())
    }

    pub fn phase(&self) -> DocumentPhase {
        match self.state.lock() {
            Ok(s) if s.pending => DocumentPhase::Analyzing,
            Ok(s) if s.report.is_some() => DocumentPhase::Reported,
            Ok(s) if s.selected.is_some() => DocumentPhase::Selected,
            _ => DocumentPhase::Empty,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().map(|s| s.pending).unwrap_or(false)
    }

    pub fn selected_name(&self) -> Option<String> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.selected.as_ref().map(|d| d.name.clone()))
    }

    pub fn report(&self) -> Option<ActiveReport> {
        self.state.lock().ok().and_then(|s| s.report.clone())
    }

    pub fn last_error(&self) -> Option<ServiceError> {
        self.state.lock().ok().and_then(|s| s.last_error.clone())
    }

    // -- Private helpers --

    fn settle(
        &self,
        epoch: u64,
        document_name: String,
        format: DocumentFormat,
        result: Result<AnalysisReport, ServiceError>,
    ) -> Result<AnalysisOutcome, DocumentError> {
        let mut state = self.lock()?;
        if state.epoch != epoch {
            tracing::debug!(
                request_epoch = epoch,
                current_epoch = state.epoch,
                document = %document_name,
                "Discarding report from a previous session"
            );
            return Ok(AnalysisOutcome::Discarded);
        }
        state.pending = false;

        match result {
            Ok(report) if !report.has_valid_score() => {
                tracing::warn!(score = report.score, "Analysis returned an out-of-range score");
                Err(DocumentError::InvalidReport(format!(
                    "score {} exceeds {}",
                    report.score, MAX_SCORE
                )))
            }
            Ok(report) => {
                tracing::info!(
                    document = %document_name,
                    score = report.score,
                    issues = report.issues.len(),
                    "Analysis complete"
                );
                let active = ActiveReport {
                    document_name,
                    format,
                    report,
                    completed_at: Utc::now(),
                };
                state.report = Some(active.clone());
                Ok(AnalysisOutcome::Completed(active))
            }
            Err(err) => {
                tracing::warn!(document = %document_name, error = %err, "Analysis failed");
                state.last_error = Some(err.clone());
                Err(DocumentError::Service(err))
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FlowState>, DocumentError> {
        self.state.lock().map_err(|e| {
            tracing::error!("Document flow lock poisoned: {}", e);
            DocumentError::State(format!("document flow lock poisoned: {}", e))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
