//! Landing page and terminal formatting shared by the chat and analyze pages.

use insureai_core::error::ServiceError;

pub const PRODUCT_NAME: &str = "InsureAI";

const FEATURES: [&str; 4] = [
    "AI-powered insurance expertise",
    "Document verification and analysis",
    "Real-time policy recommendations",
    "Secure and compliant processing",
];

/// The landing page: product pitch plus a card per tool.
pub fn home_text() -> String {
    let mut lines = vec![
        format!("{} Assistant", PRODUCT_NAME),
        String::new(),
        "Your intelligent assistant for insurance policy verification and expert consultation.".to_string(),
        "Streamline your workflow with AI-powered document analysis and instant expert guidance.".to_string(),
        String::new(),
    ];
    lines.extend(FEATURES.iter().map(|f| format!("  * {}", f)));
    lines.extend([
        String::new(),
        "AI Insurance Chat".to_string(),
        "  Instant answers to insurance questions, policy clarifications and expert guidance.".to_string(),
        "  Start chatting:      insureai chat".to_string(),
        String::new(),
        "Document Processing".to_string(),
        "  Analyse policy documents, contracts and drafts with a detailed verification report.".to_string(),
        "  Process a document:  insureai analyze <FILE> [--export report.md]".to_string(),
    ]);
    lines.join("\n")
}

/// Inline error line for a failed request, with a retry hint when it applies.
pub fn error_line(err: &ServiceError, retry_hint: &str) -> String {
    if err.is_transient() {
        format!("! {} ({})", err, retry_hint)
    } else {
        format!("! {}", err)
    }
}
