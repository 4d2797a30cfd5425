use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use verdict_core::{
    ApiError, ChatExchange, ConversationSummary, JobId, JobInput, JobSnapshot, Message,
};
use verdict_logging::{verdict_debug, verdict_warn};

use crate::api::AnalysisApi;
use crate::demo;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// Substitute demo data when no response reached the client.
    pub enabled: bool,
    /// Conversation id that always resolves to demo data.
    pub sentinel_conversation: String,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            sentinel_conversation: demo::DEMO_CONVERSATION_ID.to_string(),
        }
    }
}

/// Wraps an `AnalysisApi` and answers with demo data when the backend is unreachable.
///
/// Responses carrying a status (validation, auth, 4xx/5xx) always pass
/// through unchanged. The sentinel conversation and the fallback job never
/// touch the network.
pub struct ResilientApi<A> {
    inner: A,
    policy: FallbackPolicy,
    fallback_sequence: AtomicU64,
}

impl<A: AnalysisApi> ResilientApi<A> {
    pub fn new(inner: A, policy: FallbackPolicy) -> Self {
        Self {
            inner,
            policy,
            fallback_sequence: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn policy(&self) -> &FallbackPolicy {
        &self.policy
    }

    fn is_sentinel(&self, conversation_id: &str) -> bool {
        conversation_id == self.policy.sentinel_conversation
    }

    async fn resolve<T, F>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T, ApiError>>,
        fallback: F,
    ) -> Result<T, ApiError>
    where
        F: FnOnce() -> T,
    {
        match call.await {
            Err(err) if self.policy.enabled && err.is_transport() => {
                verdict_warn!("{} unreachable ({}), serving fallback data", operation, err);
                Ok(fallback())
            }
            other => other,
        }
    }

    fn canned_reply(&self, conversation_id: &str, text: &str) -> ChatExchange {
        let sequence = self.fallback_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        demo::reply(conversation_id, text, sequence, Utc::now())
    }
}

#[async_trait::async_trait]
impl<A: AnalysisApi> AnalysisApi for ResilientApi<A> {
    async fn submit_job(&self, input: &JobInput) -> Result<JobId, ApiError> {
        self.resolve("submit_job", self.inner.submit_job(input), demo::job_id)
            .await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        // A blip on a real job is left to the poll loop's failure policy.
        if job_id.as_str() == demo::DEMO_JOB_ID {
            verdict_debug!("Resolving fallback job {} locally", job_id);
            return Ok(demo::job_status());
        }
        self.inner.job_status(job_id).await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.resolve("list_conversations", self.inner.list_conversations(), || {
            vec![demo::conversation()]
        })
        .await
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSummary, ApiError> {
        if self.is_sentinel(conversation_id) {
            return Ok(demo::conversation());
        }
        self.resolve(
            "get_conversation",
            self.inner.get_conversation(conversation_id),
            demo::conversation,
        )
        .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        if self.is_sentinel(conversation_id) {
            return Ok(demo::messages());
        }
        self.resolve(
            "list_messages",
            self.inner.list_messages(conversation_id),
            demo::messages,
        )
        .await
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<ChatExchange, ApiError> {
        if self.is_sentinel(conversation_id) {
            return Ok(self.canned_reply(conversation_id, text));
        }
        self.resolve(
            "post_message",
            self.inner.post_message(conversation_id, text),
            || self.canned_reply(conversation_id, text),
        )
        .await
    }
}
