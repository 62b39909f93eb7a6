//! Document analysis flow for the InsureAI assistant.
//!
//! Validates an uploaded policy document client-side, drives the analysis
//! service boundary with a single outstanding request, and renders or
//! exports the resulting compliance report.

pub mod error;
pub mod export;
pub mod flow;
pub mod render;
pub mod service;
pub mod validation;

pub use error::DocumentError;
pub use export::{ExportFormat, ReportExporter};
pub use flow::{ActiveReport, AnalysisOutcome, DocumentFlow, DocumentPhase};
pub use render::{RenderedIssue, RenderedReport, ReportRenderer, ScoreBand, SeverityTag};
pub use service::{AnalysisService, MockAnalysisService};
pub use validation::DocumentValidator;
