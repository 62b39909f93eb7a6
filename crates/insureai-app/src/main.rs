mod cli;
mod pages;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use insureai_chat::{
    ChatError, ConversationFlow, MockConversationService, SubmitOutcome, TranscriptRenderer,
    THINKING_INDICATOR,
};
use insureai_core::{InsureConfig, UploadedDocument};
use insureai_document::{
    AnalysisOutcome, DocumentError, DocumentFlow, MockAnalysisService, ReportExporter,
    ReportRenderer,
};

use cli::{CliArgs, Command};

const CHAT_RETRY_HINT: &str = "type /retry to try again";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config is read before the subscriber exists so its log level can apply.
    let config_file = args.resolve_config_path();
    let (mut config, load_error) = match InsureConfig::load(&config_file) {
        Ok(config) => (config, None),
        Err(e) => (InsureConfig::default(), Some(e)),
    };

    let log_level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting InsureAI v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        None => tracing::info!(path = %config_file.display(), "Configuration loaded"),
        Some(e) => tracing::warn!(
            path = %config_file.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
    }

    if args.no_delay {
        config = config.without_delays();
    }

    match args.command() {
        Command::Home => println!("{}", pages::home_text()),
        Command::Chat => run_chat(&config).await?,
        Command::Analyze { path, json, export } => {
            run_analyze(&config, &path, json, export.as_deref()).await?
        }
    }

    tracing::info!("InsureAI shut down");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("> ");
    std::io::stdout().flush()
}

async fn run_chat(config: &InsureConfig) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(MockConversationService::from_config(&config.chat));
    let flow = ConversationFlow::new(service, config.chat.clone());
    let renderer = TranscriptRenderer::local();

    println!("AI Insurance Assistant");
    println!("Ask about coverage, claims or policy terms. /retry resends, /reset starts over, /quit exits.");
    println!();

    let mut shown = 0;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let transcript = flow.transcript();
        let entries = renderer.render(&transcript[shown.min(transcript.len())..], false);
        if !entries.is_empty() {
            println!("{}", TranscriptRenderer::to_text(&entries));
        }
        shown = transcript.len();

        prompt()?;
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let result = match line.trim() {
            "/quit" | "/exit" => break,
            "/reset" => {
                flow.reset()?;
                shown = 0;
                println!();
                continue;
            }
            "/retry" => {
                println!("{}", THINKING_INDICATOR);
                flow.retry().await
            }
            text => {
                if text.is_empty() {
                    continue;
                }
                println!("{}", THINKING_INDICATOR);
                flow.submit(text).await
            }
        };

        match result {
            Ok(SubmitOutcome::Answered(_)) | Ok(SubmitOutcome::Ignored) => {}
            Ok(SubmitOutcome::Discarded) => {
                tracing::debug!("Reply arrived after reset, dropped");
            }
            Err(ChatError::Service(err)) => {
                println!("{}", pages::error_line(&err, CHAT_RETRY_HINT));
            }
            Err(ChatError::State(msg)) => return Err(ChatError::State(msg).into()),
            Err(other) => println!("! {}", other),
        }
    }

    tracing::info!(messages = flow.transcript().len(), "Chat session ended");
    Ok(())
}

async fn run_analyze(
    config: &InsureConfig,
    path: &Path,
    json: bool,
    export: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = Arc::new(MockAnalysisService::from_config(&config.documents));
    let flow = DocumentFlow::new(service, &config.documents);

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    // Oversized files are rejected on their metadata without being read.
    let byte_size = tokio::fs::metadata(path).await?.len();
    let document = if byte_size > flow.validator().max_bytes() {
        UploadedDocument {
            name: name.clone(),
            byte_size,
            content: Vec::new(),
        }
    } else {
        UploadedDocument::new(name.clone(), tokio::fs::read(path).await?)
    };

    let format = flow.select(document.clone())?;
    eprintln!("{} ({}, {})", name, document.size_label(), format);
    eprintln!("Processing Document...");

    let active = match flow.submit().await {
        Ok(AnalysisOutcome::Completed(active)) => active,
        Ok(AnalysisOutcome::Discarded) => return Ok(()),
        Err(DocumentError::Service(err)) => {
            eprintln!("{}", pages::error_line(&err, "run the command again"));
            return Err(DocumentError::Service(err).into());
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", ReportExporter::to_json(&active)?);
    } else {
        println!("Analysis Results: {}", active.document_name);
        println!();
        println!("{}", ReportRenderer::to_text(&ReportRenderer::render(&active.report)));
    }

    if let Some(target) = export {
        let format = ReportExporter::write(&active, target, None)?;
        eprintln!("Report saved to {} ({:?})", target.display(), format);
    }
    Ok(())
}
