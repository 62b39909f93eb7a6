//! Conversation service boundary and its mock backend.
//!
//! `ConversationService` is the only seam between the flow and whatever
//! generates answers. `MockConversationService` stands in for a real backend
//! with a fixed latency and a templated answer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use insureai_core::config::ChatConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::Message;

/// Answer-generation backend for the conversation flow.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Produce one assistant message for `utterance`.
    ///
    /// `transcript` holds every message that precedes the utterance, oldest
    /// first, including the seed greeting.
    async fn respond(&self, transcript: &[Message], utterance: &str)
        -> Result<Message, ServiceError>;
}

/// Canned assistant answer for a given utterance.
pub fn mock_answer(utterance: &str) -> String {
    format!(
        "I understand you're asking about \"{}\". As an AI insurance assistant, I can help with policy analysis, compliance questions, and industry guidance. For production use, this would connect to your AI backend service to provide comprehensive insurance expertise.",
        utterance
    )
}

/// Simulated backend: waits for `delay`, then answers with [`mock_answer`].
pub struct MockConversationService {
    delay: Duration,
    failure: Option<ServiceError>,
    calls: AtomicUsize,
}

impl MockConversationService {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(Duration::from_millis(config.response_delay_ms))
    }

    /// A mock that always fails with `error` after the delay.
    pub fn failing(delay: Duration, error: ServiceError) -> Self {
        Self {
            failure: Some(error),
            ..Self::new(delay)
        }
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConversationService for MockConversationService {
    async fn respond(
        &self,
        transcript: &[Message],
        utterance: &str,
    ) -> Result<Message, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            prior_messages = transcript.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Mock conversation request"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.failure {
            Some(err) => Err(err.clone()),
            None => Ok(Message::assistant(mock_answer(utterance))),
        }
    }
}
