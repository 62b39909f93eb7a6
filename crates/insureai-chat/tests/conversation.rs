//! End-to-end conversation tests through the public API.

use std::sync::Arc;
use std::time::Duration;

use insureai_chat::{
    ChatError, ConversationFlow, MockConversationService, SubmitOutcome, TranscriptEntry,
    TranscriptRenderer,
};
use insureai_core::config::ChatConfig;
use insureai_core::error::ServiceError;
use insureai_core::types::Sender;

fn flow_with(service: MockConversationService) -> ConversationFlow {
    ConversationFlow::new(Arc::new(service), ChatConfig::default())
}

#[tokio::test]
async fn test_session_renders_greeting_and_exchanges() {
    let flow = flow_with(MockConversationService::new(Duration::ZERO));
    flow.submit("What is a rider?").await.unwrap();
    flow.submit("   ").await.unwrap();
    flow.submit("And an endorsement?").await.unwrap();

    let entries = TranscriptRenderer::local().render(&flow.transcript(), flow.is_pending());
    assert_eq!(entries.len(), 5);

    let senders: Vec<Sender> = entries
        .iter()
        .filter_map(|e| match e {
            TranscriptEntry::Message(m) => Some(m.sender),
            TranscriptEntry::Thinking => None,
        })
        .collect();
    assert_eq!(senders[0], Sender::Assistant);
    assert_eq!(senders[1], Sender::User);
    assert_eq!(senders[4], Sender::Assistant);
}

#[tokio::test(start_paused = true)]
async fn test_mock_delay_is_honoured() {
    let flow = flow_with(MockConversationService::new(Duration::from_millis(1500)));
    let started = tokio::time::Instant::now();
    let outcome = flow.submit("premium for a sedan").await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(1500));
    match outcome {
        SubmitOutcome::Answered(reply) => assert!(reply.content.contains("premium for a sedan")),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_failed_then_retried_conversation() {
    let flow = flow_with(MockConversationService::failing(
        Duration::ZERO,
        ServiceError::Timeout(30),
    ));
    let err = flow.submit("is flood damage covered?").await.unwrap_err();
    assert!(matches!(err, ChatError::Service(ServiceError::Timeout(30))));
    assert_eq!(flow.transcript().len(), 2);

    // The same backend keeps failing; retry reports it again without
    // appending another user message.
    let err = flow.retry().await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(flow.transcript().len(), 2);
}
