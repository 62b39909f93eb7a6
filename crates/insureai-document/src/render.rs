//! Report projection for display.
//!
//! Everything here is a pure function of the [`AnalysisReport`].

use serde::Serialize;

use insureai_core::types::{AnalysisReport, Severity, MAX_SCORE};

/// Scores at or above this are in the good band.
pub const GOOD_THRESHOLD: u8 = 90;
/// Scores at or above this (and below [`GOOD_THRESHOLD`]) are in the middle band.
pub const MIDDLE_THRESHOLD: u8 = 70;

/// Qualitative grouping of a compliance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Good,
    Middle,
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        if score >= GOOD_THRESHOLD {
            ScoreBand::Good
        } else if score >= MIDDLE_THRESHOLD {
            ScoreBand::Middle
        } else {
            ScoreBand::Poor
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            ScoreBand::Good => "green",
            ScoreBand::Middle => "yellow",
            ScoreBand::Poor => "red",
        }
    }
}

/// Display tag attached to each issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeverityTag {
    pub severity: Severity,
    pub label: &'static str,
    pub color: &'static str,
}

impl From<Severity> for SeverityTag {
    fn from(severity: Severity) -> Self {
        let (label, color) = match severity {
            Severity::High => ("HIGH", "red"),
            Severity::Medium => ("MEDIUM", "yellow"),
            Severity::Low => ("LOW", "blue"),
        };
        Self {
            severity,
            label,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedIssue {
    pub tag: SeverityTag,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedReport {
    /// e.g. `Compliance Score: 85/100`.
    pub score_line: String,
    pub band: ScoreBand,
    pub summary: String,
    /// e.g. `Issues Found (3)`.
    pub issues_header: String,
    pub issues: Vec<RenderedIssue>,
    pub recommendations: Vec<String>,
}

pub struct ReportRenderer;

impl ReportRenderer {
    pub fn render(report: &AnalysisReport) -> RenderedReport {
        RenderedReport {
            score_line: format!("Compliance Score: {}/{}", report.score, MAX_SCORE),
            band: ScoreBand::from_score(report.score),
            summary: report.summary.clone(),
            issues_header: format!("Issues Found ({})", report.issues.len()),
            issues: report
                .issues
                .iter()
                .map(|issue| RenderedIssue {
                    tag: SeverityTag::from(issue.severity),
                    message: issue.message.clone(),
                })
                .collect(),
            recommendations: report.recommendations.clone(),
        }
    }

    /// Plain-text form for a terminal.
    pub fn to_text(rendered: &RenderedReport) -> String {
        let mut lines = vec![
            format!("{} [{}]", rendered.score_line, rendered.band.color()),
            String::new(),
            "Analysis Summary".to_string(),
            rendered.summary.clone(),
            String::new(),
            rendered.issues_header.clone(),
        ];
        for issue in &rendered.issues {
            lines.push(format!("  [{}] {}", issue.tag.label, issue.message));
        }
        lines.push(String::new());
        lines.push("Recommendations".to_string());
        for rec in &rendered.recommendations {
            lines.push(format!("  - {}", rec));
        }
        lines.join("\n")
    }
}
