use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{InsureError, Result};

/// Greeting that seeds every new chat transcript.
pub const DEFAULT_GREETING: &str = "Hello! I'm your AI insurance assistant. I can help you with policy questions, compliance issues, and industry best practices. How can I assist you today?";

/// Upload limit advertised on the document page (10 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Top-level configuration for the InsureAI assistant.
///
/// Loaded from `~/.insureai/config.toml` by default. Each section covers one
/// flow, plus `general` for process-wide settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsureConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub documents: DocumentConfig,
}

impl InsureConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: InsureConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| InsureError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Zero the simulated service latencies, keeping everything else.
    pub fn without_delays(mut self) -> Self {
        self.chat.response_delay_ms = 0;
        self.documents.analysis_delay_ms = 0;
        self
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Conversation flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the chat page accepts submissions.
    pub enabled: bool,
    /// Assistant message that opens every transcript.
    pub greeting: String,
    /// Simulated answer latency of the mock service.
    pub response_delay_ms: u64,
    /// Upper bound on a single conversation request.
    pub request_timeout_secs: u64,
    /// Longest accepted utterance, in characters.
    pub max_message_chars: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            greeting: DEFAULT_GREETING.to_string(),
            response_delay_ms: 1500,
            request_timeout_secs: 30,
            max_message_chars: 2000,
        }
    }
}

/// Document analysis flow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// Largest accepted upload in bytes, enforced before submission.
    pub max_upload_bytes: u64,
    /// Accepted file extensions, lowercase, without the dot.
    pub allowed_extensions: Vec<String>,
    /// Simulated analysis latency of the mock service.
    pub analysis_delay_ms: u64,
    /// Upper bound on a single analysis request.
    pub request_timeout_secs: u64,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_extensions: ["pdf", "doc", "docx", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            analysis_delay_ms: 3000,
            request_timeout_secs: 60,
        }
    }
}
