//! Conversation flow: the session transcript and its single in-flight request.
//!
//! The transcript is append-only for the lifetime of a session and always
//! starts with the configured assistant greeting. At most one request to the
//! conversation service is outstanding at a time. Every session carries an
//! epoch; a response is applied only if the epoch it was issued under is
//! still current, so a reset silently discards late answers.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use insureai_core::config::ChatConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::{Message, Sender};

use crate::error::ChatError;
use crate::service::ConversationService;

/// Result of a submission that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blank input. Nothing was recorded and no request was sent.
    Ignored,
    /// The assistant answered and the reply was appended.
    Answered(Message),
    /// The session was reset while the request was in flight.
    Discarded,
}

struct FlowState {
    transcript: Vec<Message>,
    pending: bool,
    epoch: u64,
    last_error: Option<ServiceError>,
}

impl FlowState {
    fn seeded(greeting: &str, epoch: u64) -> Self {
        Self {
            transcript: vec![Message::assistant(greeting)],
            pending: false,
            epoch,
            last_error: None,
        }
    }
}

/// Clears the pending flag if a request future is dropped before it settles.
struct InFlight<'a> {
    state: &'a Mutex<FlowState>,
    epoch: u64,
    settled: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            if state.epoch == self.epoch && state.pending {
                tracing::debug!(epoch = self.epoch, "Conversation request abandoned");
                state.pending = false;
            }
        }
    }
}

/// One chat session driving a [`ConversationService`].
pub struct ConversationFlow {
    service: Arc<dyn ConversationService>,
    config: ChatConfig,
    state: Mutex<FlowState>,
}

impl ConversationFlow {
    /// Start a session seeded with `config.greeting`.
    pub fn new(service: Arc<dyn ConversationService>, config: ChatConfig) -> Self {
        let state = FlowState::seeded(&config.greeting, 0);
        Self {
            service,
            config,
            state: Mutex::new(state),
        }
    }

    /// Submit a user utterance and wait for the assistant's answer.
    ///
    /// Whitespace-only input is a no-op. The user message is appended before
    /// the request is sent; on failure it stays in the transcript and
    /// [`retry`](Self::retry) can re-send it.
    pub async fn submit(&self, utterance: &str) -> Result<SubmitOutcome, ChatError> {
        let text = utterance.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring blank utterance");
            return Ok(SubmitOutcome::Ignored);
        }
        if !self.config.enabled {
            return Err(ChatError::Disabled);
        }
        if text.chars().count() > self.config.max_message_chars {
            return Err(ChatError::MessageTooLong(self.config.max_message_chars));
        }

        let (prior, epoch) = {
            let mut state = self.lock()?;
            if state.pending {
                return Err(ChatError::ResponsePending);
            }
            let prior = state.transcript.clone();
            state.transcript.push(Message::user(text));
            state.pending = true;
            state.last_error = None;
            (prior, state.epoch)
        };

        tracing::debug!(epoch, chars = text.chars().count(), "Utterance submitted");
        self.dispatch(prior, text, epoch).await
    }

    /// Re-send the most recent user message if it never got an answer.
    pub async fn retry(&self) -> Result<SubmitOutcome, ChatError> {
        let (prior, utterance, epoch) = {
            let mut state = self.lock()?;
            if state.pending {
                return Err(ChatError::ResponsePending);
            }
            let utterance = match state.transcript.last() {
                Some(last) if last.sender == Sender::User => last.content.clone(),
                _ => return Err(ChatError::NothingToRetry),
            };
            let prior = state.transcript[..state.transcript.len() - 1].to_vec();
            state.pending = true;
            state.last_error = None;
            (prior, utterance, state.epoch)
        };

        tracing::debug!(epoch, "Retrying unanswered utterance");
        self.dispatch(prior, &utterance, epoch).await
    }

    /// Drop the transcript and start a fresh session.
    ///
    /// An in-flight request keeps running; its answer is discarded on arrival.
    pub fn reset(&self) -> Result<(), ChatError> {
        let mut state = self.lock()?;
        let epoch = state.epoch + 1;
        *state = FlowState::seeded(&self.config.greeting, epoch);
        tracing::info!(epoch, "Conversation reset");
        Ok(())
    }

    /// Snapshot of the transcript, oldest first.
    pub fn transcript(&self) -> Vec<Message> {
        self.state
            .lock()
            .map(|s| s.transcript.clone())
            .unwrap_or_default()
    }

    /// Whether a request is outstanding.
    pub fn is_pending(&self) -> bool {
        self.state.lock().map(|s| s.pending).unwrap_or(false)
    }

    /// Error of the most recent request, cleared by the next submission.
    pub fn last_error(&self) -> Option<ServiceError> {
        self.state.lock().ok().and_then(|s| s.last_error.clone())
    }

    // -- Private helpers --

    async fn dispatch(
        &self,
        prior: Vec<Message>,
        utterance: &str,
        epoch: u64,
    ) -> Result<SubmitOutcome, ChatError> {
        let mut in_flight = InFlight {
            state: &self.state,
            epoch,
            settled: false,
        };

        let limit = self.config.request_timeout_secs;
        let request = self.service.respond(&prior, utterance);
        let result = if limit == 0 {
            request.await
        } else {
            match tokio::time::timeout(Duration::from_secs(limit), request).await {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout(limit)),
            }
        };

        in_flight.settled = true;
        self.settle(epoch, result)
    }

    fn settle(
        &self,
        epoch: u64,
        result: Result<Message, ServiceError>,
    ) -> Result<SubmitOutcome, ChatError> {
        let mut state = self.lock()?;
        if state.epoch != epoch {
            tracing::debug!(
                request_epoch = epoch,
                current_epoch = state.epoch,
                "Discarding response from a previous session"
            );
            return Ok(SubmitOutcome::Discarded);
        }
        state.pending = false;

        let result = result.and_then(|reply| {
            if reply.sender == Sender::Assistant {
                Ok(reply)
            } else {
                Err(ServiceError::MalformedContent(
                    "reply was not authored by the assistant".to_string(),
                ))
            }
        });

        match result {
            Ok(reply) => {
                state.transcript.push(reply.clone());
                tracing::debug!(epoch, messages = state.transcript.len(), "Assistant replied");
                Ok(SubmitOutcome::Answered(reply))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Conversation request failed");
                state.last_error = Some(err.clone());
                Err(ChatError::Service(err))
            }
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, FlowState>, ChatError> {
        self.state.lock().map_err(|e| {
            tracing::error!("Conversation lock poisoned: {}", e);
            ChatError::State(format!("conversation lock poisoned: {}", e))
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::MockConversationService;
    use async_trait::async_trait;
    use insureai_core::config::DEFAULT_GREETING;
    use tokio::sync::Notify;

    fn instant_flow() -> (ConversationFlow, Arc<MockConversationService>) {
        let service = Arc::new(MockConversationService::new(Duration::ZERO));
        let flow = ConversationFlow::new(service.clone(), ChatConfig::default());
        (flow, service)
    }

    /// Holds every request until the test releases it.
    #[derive(Default)]
    struct GatedService {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ConversationService for GatedService {
        async fn respond(
            &self,
            _transcript: &[Message],
            utterance: &str,
        ) -> Result<Message, ServiceError> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Message::assistant(format!("answer to {}", utterance)))
        }
    }

    struct SlowService;

    #[async_trait]
    impl ConversationService for SlowService {
        async fn respond(
            &self,
            _transcript: &[Message],
            _utterance: &str,
        ) -> Result<Message, ServiceError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(Message::assistant("too late"))
        }
    }

    struct ImpostorService;

    #[async_trait]
    impl ConversationService for ImpostorService {
        async fn respond(
            &self,
            _transcript: &[Message],
            utterance: &str,
        ) -> Result<Message, ServiceError> {
            Ok(Message::user(utterance))
        }
    }

    // ---- Seed ----

    #[test]
    fn test_new_flow_is_seeded_with_greeting() {
        let (flow, _) = instant_flow();
        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].sender, Sender::Assistant);
        assert_eq!(transcript[0].content, DEFAULT_GREETING);
        assert!(!flow.is_pending());
    }

    // ---- Submission ----

    #[tokio::test]
    async fn test_submit_appends_user_then_assistant() {
        let (flow, service) = instant_flow();
        let outcome = flow.submit("Does my policy cover hail?").await.unwrap();

        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].sender, Sender::User);
        assert_eq!(transcript[1].content, "Does my policy cover hail?");
        assert_eq!(transcript[2].sender, Sender::Assistant);
        assert_eq!(outcome, SubmitOutcome::Answered(transcript[2].clone()));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn test_transcript_length_is_two_n_plus_one() {
        let (flow, _) = instant_flow();
        for n in 1..=6 {
            flow.submit(&format!("question {}", n)).await.unwrap();
            assert_eq!(flow.transcript().len(), 2 * n + 1);
        }
    }

    #[tokio::test]
    async fn test_transcript_preserves_insertion_order() {
        let (flow, _) = instant_flow();
        flow.submit("first").await.unwrap();
        flow.submit("second").await.unwrap();

        let transcript = flow.transcript();
        let senders: Vec<Sender> = transcript.iter().map(|m| m.sender).collect();
        assert_eq!(
            senders,
            vec![
                Sender::Assistant,
                Sender::User,
                Sender::Assistant,
                Sender::User,
                Sender::Assistant
            ]
        );
        assert_eq!(transcript[1].content, "first");
        assert_eq!(transcript[3].content, "second");
    }

    #[tokio::test]
    async fn test_user_content_is_trimmed() {
        let (flow, _) = instant_flow();
        flow.submit("  umbrella policy \n").await.unwrap();
        assert_eq!(flow.transcript()[1].content, "umbrella policy");
    }

    // ---- Blank input ----

    #[tokio::test]
    async fn test_empty_and_whitespace_submissions_are_noops() {
        let (flow, service) = instant_flow();
        for blank in ["", "   ", "\t\n", " \r\n "] {
            assert_eq!(flow.submit(blank).await.unwrap(), SubmitOutcome::Ignored);
        }
        assert_eq!(flow.transcript().len(), 1);
        assert_eq!(service.calls(), 0);
    }

    // ---- Validation ----

    #[tokio::test]
    async fn test_disabled_returns_error() {
        let service = Arc::new(MockConversationService::new(Duration::ZERO));
        let config = ChatConfig {
            enabled: false,
            ..ChatConfig::default()
        };
        let flow = ConversationFlow::new(service.clone(), config);
        let err = flow.submit("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::Disabled));
        assert_eq!(flow.transcript().len(), 1);
        assert_eq!(service.calls(), 0);
    }

    #[tokio::test]
    async fn test_message_too_long_is_rejected_before_request() {
        let service = Arc::new(MockConversationService::new(Duration::ZERO));
        let config = ChatConfig {
            max_message_chars: 10,
            ..ChatConfig::default()
        };
        let flow = ConversationFlow::new(service.clone(), config);

        let err = flow.submit(&"a".repeat(11)).await.unwrap_err();
        assert!(matches!(err, ChatError::MessageTooLong(10)));
        assert_eq!(service.calls(), 0);

        assert!(flow.submit(&"a".repeat(10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_length_limit_counts_characters_not_bytes() {
        let service = Arc::new(MockConversationService::new(Duration::ZERO));
        let config = ChatConfig {
            max_message_chars: 4,
            ..ChatConfig::default()
        };
        let flow = ConversationFlow::new(service, config);
        assert!(flow.submit("\u{00e9}t\u{00e9}s").await.is_ok());
    }

    // ---- Pending exclusion ----

    #[tokio::test]
    async fn test_second_submit_while_pending_is_rejected() {
        let service = Arc::new(GatedService::default());
        let flow = Arc::new(ConversationFlow::new(service.clone(), ChatConfig::default()));

        let first = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit("first").await })
        };
        service.started.notified().await;
        assert!(flow.is_pending());

        let err = flow.submit("second").await.unwrap_err();
        assert!(matches!(err, ChatError::ResponsePending));

        service.release.notify_one();
        let outcome = first.await.unwrap().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Answered(_)));
        assert!(!flow.is_pending());
        assert_eq!(flow.transcript().len(), 3);
    }

    // ---- Stale responses ----

    #[tokio::test]
    async fn test_reset_discards_late_response() {
        let service = Arc::new(GatedService::default());
        let flow = Arc::new(ConversationFlow::new(service.clone(), ChatConfig::default()));

        let first = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit("before reset").await })
        };
        service.started.notified().await;
        flow.reset().unwrap();
        assert!(!flow.is_pending());

        service.release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SubmitOutcome::Discarded);

        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, DEFAULT_GREETING);
    }

    #[tokio::test]
    async fn test_submit_allowed_after_reset_even_with_request_in_flight() {
        let service = Arc::new(GatedService::default());
        let flow = Arc::new(ConversationFlow::new(service.clone(), ChatConfig::default()));

        let stale = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit("old session").await })
        };
        service.started.notified().await;
        flow.reset().unwrap();

        let fresh = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit("new session").await })
        };
        service.started.notified().await;

        service.release.notify_one();
        service.release.notify_one();
        let outcomes = [stale.await.unwrap().unwrap(), fresh.await.unwrap().unwrap()];
        assert!(outcomes.contains(&SubmitOutcome::Discarded));

        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].content, "new session");
    }

    // ---- Failures ----

    #[tokio::test]
    async fn test_service_failure_is_inline_and_retryable() {
        let service = Arc::new(MockConversationService::failing(
            Duration::ZERO,
            ServiceError::ServiceUnavailable("backend offline".into()),
        ));
        let flow = ConversationFlow::new(service, ChatConfig::default());

        let err = flow.submit("claim status").await.unwrap_err();
        assert!(err.is_retryable());
        assert!(!flow.is_pending());
        assert_eq!(
            flow.last_error(),
            Some(ServiceError::ServiceUnavailable("backend offline".into()))
        );
        // User message stays, no assistant reply
        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].sender, Sender::User);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_service_times_out() {
        let config = ChatConfig {
            request_timeout_secs: 5,
            ..ChatConfig::default()
        };
        let flow = ConversationFlow::new(Arc::new(SlowService), config);

        let err = flow.submit("anyone there?").await.unwrap_err();
        assert!(matches!(err, ChatError::Service(ServiceError::Timeout(5))));
        assert_eq!(flow.last_error(), Some(ServiceError::Timeout(5)));
        assert!(!flow.is_pending());
    }

    #[tokio::test]
    async fn test_non_assistant_reply_is_malformed() {
        let flow = ConversationFlow::new(Arc::new(ImpostorService), ChatConfig::default());
        let err = flow.submit("hello").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::Service(ServiceError::MalformedContent(_))
        ));
        assert_eq!(flow.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_next_submission_clears_last_error() {
        let service = Arc::new(GatedService::default());
        let flow = Arc::new(ConversationFlow::new(service.clone(), ChatConfig::default()));
        {
            let mut state = flow.state.lock().unwrap();
            state.last_error = Some(ServiceError::Timeout(1));
        }

        let pending = {
            let flow = Arc::clone(&flow);
            tokio::spawn(async move { flow.submit("again").await })
        };
        service.started.notified().await;
        assert!(flow.last_error().is_none());
        service.release.notify_one();
        pending.await.unwrap().unwrap();
    }

    // ---- Retry ----

    #[tokio::test]
    async fn test_retry_answers_unanswered_message_without_duplicating_it() {
        let service = Arc::new(GatedService::default());
        let flow = Arc::new(ConversationFlow::new(service.clone(), ChatConfig::default()));
        {
            let mut state = flow.state.lock().unwrap();
            state.transcript.push(Message::user("lost question"));
            state.last_error = Some(ServiceError::Timeout(30));
        }

        service.release.notify_one();
        let outcome = flow.retry().await.unwrap();
        match outcome {
            SubmitOutcome::Answered(reply) => assert_eq!(reply.content, "answer to lost question"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 3);
        assert_eq!(transcript[1].content, "lost question");
        assert!(flow.last_error().is_none());
    }

    #[tokio::test]
    async fn test_retry_with_nothing_unanswered() {
        let (flow, service) = instant_flow();
        assert!(matches!(
            flow.retry().await.unwrap_err(),
            ChatError::NothingToRetry
        ));
        flow.submit("answered").await.unwrap();
        assert!(matches!(
            flow.retry().await.unwrap_err(),
            ChatError::NothingToRetry
        ));
        assert_eq!(service.calls(), 1);
    }

    // ---- Abandoned requests ----

    #[tokio::test(start_paused = true)]
    async fn test_dropped_request_clears_pending() {
        let service = Arc::new(GatedService::default());
        let flow = ConversationFlow::new(service.clone(), ChatConfig::default());

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), flow.submit("walk away")).await;
        assert!(abandoned.is_err());
        assert!(!flow.is_pending());
        assert_eq!(flow.transcript().len(), 2);

        service.release.notify_one();
        assert!(matches!(
            flow.retry().await.unwrap(),
            SubmitOutcome::Answered(_)
        ));
        assert_eq!(flow.transcript().len(), 3);
    }

    // ---- Reset ----

    #[tokio::test]
    async fn test_reset_restores_seed_transcript() {
        let (flow, _) = instant_flow();
        flow.submit("one").await.unwrap();
        flow.submit("two").await.unwrap();
        flow.reset().unwrap();

        let transcript = flow.transcript();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript[0].content, DEFAULT_GREETING);
        assert!(flow.last_error().is_none());
    }

    #[test]
    fn test_custom_greeting() {
        let service = Arc::new(MockConversationService::new(Duration::ZERO));
        let config = ChatConfig {
            greeting: "Welcome back.".into(),
            ..ChatConfig::default()
        };
        let flow = ConversationFlow::new(service, config);
        assert_eq!(flow.transcript()[0].content, "Welcome back.");
    }
}
