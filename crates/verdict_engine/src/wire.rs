//! JSON bodies exchanged with the analysis backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use verdict_core::{ChatExchange, JobId, JobResult, JobSnapshot, JobStatus, Message, Progress};

#[derive(Debug, Serialize)]
pub(crate) struct ScrapeRequest<'a> {
    pub reddit_url: &'a str,
    pub max_comments: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScrapeTaskResponse {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskStatusResponse {
    #[serde(default)]
    pub task_id: Option<String>,
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<Progress>,
}

impl TaskStatusResponse {
    pub fn into_snapshot(self, requested: &JobId) -> JobSnapshot {
        let status = JobStatus::from_backend(&self.status);
        let job_id = self.task_id.map(JobId::new).unwrap_or_else(|| requested.clone());
        JobSnapshot {
            job_id,
            status,
            progress: self.progress,
            result: match status {
                JobStatus::Succeeded => Some(JobResult::new(self.result.unwrap_or(Value::Null))),
                _ => None,
            },
            error: match status {
                JobStatus::Failed => self.error,
                _ => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub conversation_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub conversation_id: String,
    pub user_message: Message,
    pub assistant_message: Message,
}

impl From<ChatResponse> for ChatExchange {
    fn from(response: ChatResponse) -> Self {
        ChatExchange {
            conversation_id: response.conversation_id,
            user_message: response.user_message,
            assistant_message: response.assistant_message,
        }
    }
}

/// FastAPI error envelope; `detail` is a string or a list of field errors.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) => Some(text.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}
