//! Conversation flow for the InsureAI assistant.
//!
//! Keeps the session transcript, drives the conversation service boundary
//! with a single outstanding request, and projects the transcript for display.

pub mod error;
pub mod flow;
pub mod render;
pub mod service;

pub use error::ChatError;
pub use flow::{ConversationFlow, SubmitOutcome};
pub use render::{Align, RenderedMessage, TranscriptEntry, TranscriptRenderer, THINKING_INDICATOR};
pub use service::{ConversationService, MockConversationService};
