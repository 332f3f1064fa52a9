//! crates/diagnostic_core/src/advisor.rs
//!
//! The advisory chat service. Each call is independent: the caller
//! supplies the whole conversation, the service re-grounds it in the
//! company's latest stored report and delegates to the injected
//! text-generation provider.

use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::ChatMessage;
use crate::ports::{PortError, PortResult, ReportStore, TextGenerationProvider};

/// Returned when the company has no stored report yet. A defined empty
/// state, not an error; the provider is never called in this case.
pub const NO_REPORT_MESSAGE: &str = "I don't see any diagnostic reports for your company yet. \
     Please run a diagnostic test first so I can understand your business context.";

/// Returned when the provider call fails. Chat degrades gracefully
/// instead of breaking the page.
pub const CONNECTION_TROUBLE_MESSAGE: &str = "I'm having trouble connecting to my analysis \
     engine right now. Please try again in a moment.";

pub struct AdvisoryChat {
    provider: Arc<dyn TextGenerationProvider>,
    store: Arc<dyn ReportStore>,
}

impl AdvisoryChat {
    pub fn new(provider: Arc<dyn TextGenerationProvider>, store: Arc<dyn ReportStore>) -> Self {
        Self { provider, store }
    }

    /// Produces the assistant's next turn for the given conversation.
    pub async fn respond(
        &self,
        company_id: Uuid,
        conversation: &[ChatMessage],
    ) -> PortResult<ChatMessage> {
        let report = match self.store.latest(company_id).await? {
            Some(report) => report,
            None => return Ok(ChatMessage::assistant(NO_REPORT_MESSAGE)),
        };

        match self.provider.generate_chat_reply(&report, conversation).await {
            Ok(content) => Ok(ChatMessage::assistant(content)),
            Err(PortError::ExternalService(reason)) | Err(PortError::MalformedResponse(reason)) => {
                warn!("advisory chat degraded: {}", reason);
                Ok(ChatMessage::assistant(CONNECTION_TROUBLE_MESSAGE))
            }
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChatRole;
    use crate::generator::test_support::{InMemoryStore, ScriptedProvider};
    use chrono::Utc;

    fn user_turn(content: &str) -> Vec<ChatMessage> {
        vec![ChatMessage {
            role: ChatRole::User,
            content: content.to_string(),
        }]
    }

    #[tokio::test]
    async fn no_stored_report_short_circuits_before_the_provider() {
        let store = Arc::new(InMemoryStore::default());
        let provider = Arc::new(ScriptedProvider::chatting(Ok("unused".to_string())));
        let chat = AdvisoryChat::new(provider.clone(), store);

        let reply = chat
            .respond(Uuid::new_v4(), &user_turn("what's my score"))
            .await
            .unwrap();

        assert_eq!(reply.content, NO_REPORT_MESSAGE);
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn grounded_reply_comes_from_the_provider() {
        let store = Arc::new(InMemoryStore::default());
        let company_id = Uuid::new_v4();
        store.seed(company_id, 78, Utc::now());
        let provider = Arc::new(ScriptedProvider::chatting(Ok(
            "Your score of 78 reflects solid fundamentals.".to_string(),
        )));
        let chat = AdvisoryChat::new(provider, store);

        let reply = chat
            .respond(company_id, &user_turn("what's my score"))
            .await
            .unwrap();

        assert_eq!(reply.role, ChatRole::Assistant);
        assert!(reply.content.contains("78"));
    }

    #[tokio::test]
    async fn provider_failure_degrades_to_a_canned_message() {
        let store = Arc::new(InMemoryStore::default());
        let company_id = Uuid::new_v4();
        store.seed(company_id, 60, Utc::now());
        let provider = Arc::new(ScriptedProvider::chatting(Err(
            PortError::ExternalService("timeout".to_string()),
        )));
        let chat = AdvisoryChat::new(provider, store);

        let reply = chat
            .respond(company_id, &user_turn("hello"))
            .await
            .unwrap();

        assert_eq!(reply.content, CONNECTION_TROUBLE_MESSAGE);
    }
}
