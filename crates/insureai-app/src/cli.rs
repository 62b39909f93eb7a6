//! CLI argument definitions for the InsureAI assistant.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// InsureAI: an insurance assistant for policy questions and document checks.
#[derive(Parser, Debug)]
#[command(name = "insureai", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Answer immediately instead of simulating service latency.
    #[arg(long = "no-delay", global = true)]
    pub no_delay: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the landing page.
    Home,
    /// Chat with the insurance assistant.
    Chat,
    /// Analyse a policy document (PDF, DOC, DOCX, TXT).
    Analyze {
        /// Document to analyse.
        path: PathBuf,
        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
        /// Also save the report (.md or .json).
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
}

impl CliArgs {
    /// The page to open; the landing page when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Home)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > INSUREAI_CONFIG env var > platform default (~/.insureai/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("INSUREAI_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".insureai").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".insureai").join("config.toml");
    }
    PathBuf::from("config.toml")
}
