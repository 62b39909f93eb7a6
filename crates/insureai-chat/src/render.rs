//! Transcript projection for display.
//!
//! Pure: the output depends only on the messages, the pending flag and the
//! display offset. Entries keep insertion order, oldest first.

use chrono::{FixedOffset, Local};
use serde::Serialize;
use uuid::Uuid;

use insureai_core::types::{Message, Sender};

/// Text shown while the assistant's answer is outstanding.
pub const THINKING_INDICATOR: &str = "AI is thinking...";

/// Horizontal placement of a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Right,
}

/// One message ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedMessage {
    pub id: Uuid,
    pub sender: Sender,
    pub label: &'static str,
    pub content: String,
    /// `HH:MM` in the renderer's offset.
    pub time: String,
    pub align: Align,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TranscriptEntry {
    Message(RenderedMessage),
    Thinking,
}

pub struct TranscriptRenderer {
    offset: FixedOffset,
}

impl TranscriptRenderer {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Renderer using the machine's current local offset.
    pub fn local() -> Self {
        Self::new(*Local::now().offset())
    }

    pub fn render(&self, messages: &[Message], pending: bool) -> Vec<TranscriptEntry> {
        let mut entries: Vec<TranscriptEntry> = messages
            .iter()
            .map(|m| TranscriptEntry::Message(self.render_message(m)))
            .collect();
        if pending {
            entries.push(TranscriptEntry::Thinking);
        }
        entries
    }

    pub fn render_message(&self, message: &Message) -> RenderedMessage {
        let (label, align) = match message.sender {
            Sender::User => ("You", Align::Right),
            Sender::Assistant => ("Assistant", Align::Left),
        };
        RenderedMessage {
            id: message.id,
            sender: message.sender,
            label,
            content: message.content.clone(),
            time: self.format_time(message),
            align,
        }
    }

    pub fn format_time(&self, message: &Message) -> String {
        message
            .timestamp
            .with_timezone(&self.offset)
            .format("%H:%M")
            .to_string()
    }

    /// Plain-text form for a terminal, one entry per line.
    pub fn to_text(entries: &[TranscriptEntry]) -> String {
        entries
            .iter()
            .map(|entry| match entry {
                TranscriptEntry::Message(m) => match m.align {
                    Align::Left => format!("[{}] {}: {}", m.time, m.label, m.content),
                    Align::Right => format!("[{}] {} > {}", m.time, m.label, m.content),
                },
                TranscriptEntry::Thinking => format!("        {}", THINKING_INDICATOR),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TranscriptRenderer {
    fn default() -> Self {
        Self::local()
    }
}
