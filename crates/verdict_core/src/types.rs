use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conversation::PROVISIONAL_PREFIX;

/// Backend-assigned identifier of a submitted analysis job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    /// Maps the backend's free-form status string.
    ///
    /// Only the known terminal tokens end a job; anything unrecognized keeps
    /// it running so that new backend states never stop polling early.
    pub fn from_backend(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "succeeded" => JobStatus::Succeeded,
            "failure" | "failed" | "revoked" => JobStatus::Failed,
            "pending" | "received" => JobStatus::Pending,
            _ => JobStatus::Running,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub done: u64,
    pub total: u64,
}

impl Progress {
    /// Combines an older report with a newer one without moving backwards.
    pub fn merge(previous: Option<Progress>, next: Option<Progress>) -> Option<Progress> {
        match (previous, next) {
            (Some(prev), Some(next)) => Some(Progress {
                done: prev.done.max(next.done),
                total: next.total.max(prev.total),
            }),
            (prev, None) => prev,
            (None, next) => next,
        }
    }
}

/// Opaque success payload of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobResult(serde_json::Value);

impl JobResult {
    pub fn new(payload: serde_json::Value) -> Self {
        Self(payload)
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.0
    }

    /// Downstream conversation created by the analysis, when the backend sent one.
    pub fn conversation_id(&self) -> Option<&str> {
        self.0.get("conversation_id").and_then(|value| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: Option<Progress>,
    pub result: Option<JobResult>,
    pub error: Option<String>,
}

impl JobSnapshot {
    pub fn pending(job_id: JobId) -> Self {
        Self {
            job_id,
            status: JobStatus::Pending,
            progress: None,
            result: None,
            error: None,
        }
    }

    pub fn succeeded(job_id: JobId, result: JobResult) -> Self {
        Self {
            status: JobStatus::Succeeded,
            result: Some(result),
            ..Self::pending(job_id)
        }
    }

    pub fn failed(job_id: JobId, error: impl Into<String>) -> Self {
        Self {
            status: JobStatus::Failed,
            error: Some(error.into()),
            ..Self::pending(job_id)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Message identifier; provisional ids carry the reserved prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(PROVISIONAL_PREFIX)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_optimistic: bool,
}

impl Message {
    /// A server-confirmed message.
    pub fn confirmed(
        id: impl Into<String>,
        role: Role,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(id),
            role,
            content: content.into(),
            created_at,
            is_optimistic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "reddit_url")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub total_comments: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Server-confirmed outcome of posting one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatExchange {
    pub conversation_id: String,
    pub user_message: Message,
    pub assistant_message: Message,
}
