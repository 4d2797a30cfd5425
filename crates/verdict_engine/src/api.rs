use std::sync::Arc;

use verdict_core::{
    ApiError, ChatExchange, ConversationSummary, JobId, JobInput, JobSnapshot, Message,
};

/// Remote operations the client core depends on.
#[async_trait::async_trait]
pub trait AnalysisApi: Send + Sync {
    async fn submit_job(&self, input: &JobInput) -> Result<JobId, ApiError>;

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError>;

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError>;

    async fn get_conversation(&self, conversation_id: &str)
        -> Result<ConversationSummary, ApiError>;

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;

    async fn post_message(&self, conversation_id: &str, text: &str)
        -> Result<ChatExchange, ApiError>;
}

#[async_trait::async_trait]
impl<T: AnalysisApi + ?Sized> AnalysisApi for Arc<T> {
    async fn submit_job(&self, input: &JobInput) -> Result<JobId, ApiError> {
        (**self).submit_job(input).await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        (**self).job_status(job_id).await
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        (**self).list_conversations().await
    }

    async fn get_conversation(&self, conversation_id: &str)
        -> Result<ConversationSummary, ApiError> {
        (**self).get_conversation(conversation_id).await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        (**self).list_messages(conversation_id).await
    }

    async fn post_message(&self, conversation_id: &str, text: &str)
        -> Result<ChatExchange, ApiError> {
        (**self).post_message(conversation_id, text).await
    }
}
