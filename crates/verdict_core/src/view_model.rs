use crate::{ApiError, JobId, JobSnapshot, Message, TaskPhase};

/// Shown when a job fails without the backend saying why.
pub const GENERIC_FAILURE: &str = "analysis failed";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskView {
    pub phase: TaskPhase,
    pub job_id: Option<JobId>,
    pub snapshot: Option<JobSnapshot>,
    pub is_polling: bool,
    pub error: Option<String>,
    pub polls_issued: u32,
    pub consecutive_failures: u32,
}

impl TaskView {
    pub fn conversation_id(&self) -> Option<&str> {
        self.snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.result.as_ref())
            .and_then(|result| result.conversation_id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConversationView {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub is_sending: bool,
    pub last_error: Option<ApiError>,
}
