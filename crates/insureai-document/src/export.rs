//! Report download: writes the active report to disk as Markdown or JSON.

use std::path::Path;

use insureai_core::error::InsureError;

use crate::error::DocumentError;
use crate::flow::{ActiveReport, DocumentFlow};
use crate::render::ReportRenderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Markdown,
    Json,
}

impl ExportFormat {
    /// Infer the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(ExportFormat::Markdown),
            "json" => Some(ExportFormat::Json),
            _ => None,
        }
    }
}

pub struct ReportExporter;

impl ReportExporter {
    pub fn to_markdown(active: &ActiveReport) -> String {
        let rendered = ReportRenderer::render(&active.report);
        let mut out = String::new();
        out.push_str(&format!("# Compliance Report: {}\n\n", active.document_name));
        out.push_str(&format!(
            "- Format: {}\n- Analysed: {}\n- {} ({})\n\n",
            active.format,
            active.completed_at.format("%Y-%m-%d %H:%M UTC"),
            rendered.score_line,
            rendered.band.color()
        ));
        out.push_str("## Analysis Summary\n\n");
        out.push_str(&rendered.summary);
        out.push_str("\n\n");
        out.push_str(&format!("## {}\n\n", rendered.issues_header));
        for issue in &rendered.issues {
            out.push_str(&format!("- **{}** {}\n", issue.tag.label, issue.message));
        }
        out.push_str("\n## Recommendations\n\n");
        for (i, rec) in rendered.recommendations.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, rec));
        }
        out
    }

    pub fn to_json(active: &ActiveReport) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(active).map_err(|e| InsureError::from(e).into())
    }

    pub fn encode(active: &ActiveReport, format: ExportFormat) -> Result<String, DocumentError> {
        match format {
            ExportFormat::Markdown => Ok(Self::to_markdown(active)),
            ExportFormat::Json => Self::to_json(active),
        }
    }

    /// Write `active` to `path`. Without an explicit `format` it is inferred
    /// from the extension.
    pub fn write(
        active: &ActiveReport,
        path: &Path,
        format: Option<ExportFormat>,
    ) -> Result<ExportFormat, DocumentError> {
        let format = format
            .or_else(|| ExportFormat::from_path(path))
            .ok_or_else(|| {
                DocumentError::Export(format!(
                    "cannot infer export format from {}",
                    path.display()
                ))
            })?;
        let body = Self::encode(active, format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, body)?;
        tracing::info!(path = %path.display(), ?format, "Report exported");
        Ok(format)
    }

    /// Export whatever report `flow` currently holds.
    pub fn write_from(
        flow: &DocumentFlow,
        path: &Path,
        format: Option<ExportFormat>,
    ) -> Result<ExportFormat, DocumentError> {
        let active = flow.report().ok_or(DocumentError::NoReport)?;
        Self::write(&active, path, format)
    }
}
