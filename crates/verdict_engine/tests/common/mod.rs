#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use chrono::{TimeZone, Utc};
use verdict_core::{
    ApiError, ChatExchange, ConversationSummary, JobId, JobInput, JobSnapshot, JobStatus,
    Message, Role,
};
use verdict_engine::AnalysisApi;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(verdict_logging::initialize_for_tests);
}

pub fn transport() -> ApiError {
    ApiError::Transport("network unreachable".to_string())
}

pub fn status(id: &str, status: &str) -> JobSnapshot {
    JobSnapshot {
        status: JobStatus::from_backend(status),
        ..JobSnapshot::pending(id.into())
    }
}

pub fn message(id: &str, role: Role, text: &str) -> Message {
    Message::confirmed(id, role, text, Utc.with_ymd_and_hms(2025, 5, 2, 9, 0, 0).unwrap())
}

pub fn exchange(suffix: &str, text: &str) -> ChatExchange {
    ChatExchange {
        conversation_id: "conv-1".to_string(),
        user_message: message(&format!("u-{suffix}"), Role::User, text),
        assistant_message: message(&format!("a-{suffix}"), Role::Assistant, "Consensus is mixed."),
    }
}

/// In-memory backend that replays scripted answers and counts calls.
pub struct ScriptedApi {
    submit: Mutex<Option<Result<JobId, ApiError>>>,
    statuses: Mutex<VecDeque<Result<JobSnapshot, ApiError>>>,
    status_delay: Duration,
    posts: Mutex<VecDeque<(Duration, Result<ChatExchange, ApiError>)>>,
    messages: Vec<Message>,
    conversations: Vec<ConversationSummary>,
    status_calls: AtomicUsize,
    calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            submit: Mutex::new(Some(Ok(JobId::from("task-1")))),
            statuses: Mutex::new(VecDeque::new()),
            status_delay: Duration::ZERO,
            posts: Mutex::new(VecDeque::new()),
            messages: Vec::new(),
            conversations: Vec::new(),
            status_calls: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn submit_result(self, result: Result<JobId, ApiError>) -> Self {
        *self.submit.lock().unwrap() = Some(result);
        self
    }

    pub fn statuses(self, statuses: Vec<Result<JobSnapshot, ApiError>>) -> Self {
        *self.statuses.lock().unwrap() = statuses.into();
        self
    }

    pub fn status_delay(mut self, delay: Duration) -> Self {
        self.status_delay = delay;
        self
    }

    pub fn post(self, delay: Duration, result: Result<ChatExchange, ApiError>) -> Self {
        self.posts.lock().unwrap().push_back((delay, result));
        self
    }

    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl AnalysisApi for ScriptedApi {
    async fn submit_job(&self, _input: &JobInput) -> Result<JobId, ApiError> {
        self.touch();
        self.submit
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(transport()))
    }

    async fn job_status(&self, _job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        self.touch();
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        if !self.status_delay.is_zero() {
            tokio::time::sleep(self.status_delay).await;
        }
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(transport()))
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.touch();
        Ok(self.conversations.clone())
    }

    async fn get_conversation(&self, conversation_id: &str) -> Result<ConversationSummary, ApiError> {
        self.touch();
        self.conversations
            .iter()
            .find(|c| c.id == conversation_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))
    }

    async fn list_messages(&self, _conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.touch();
        Ok(self.messages.clone())
    }

    async fn post_message(&self, _conversation_id: &str, _text: &str) -> Result<ChatExchange, ApiError> {
        self.touch();
        let next = self.posts.lock().unwrap().pop_front();
        let (delay, result) = next.unwrap_or((Duration::ZERO, Err(transport())));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

/// Backend that never answers: every call fails before a response.
pub struct UnreachableApi {
    calls: AtomicUsize,
}

impl UnreachableApi {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(transport())
    }
}

#[async_trait::async_trait]
impl AnalysisApi for UnreachableApi {
    async fn submit_job(&self, _input: &JobInput) -> Result<JobId, ApiError> {
        self.fail()
    }

    async fn job_status(&self, _job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        self.fail()
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.fail()
    }

    async fn get_conversation(&self, _conversation_id: &str) -> Result<ConversationSummary, ApiError> {
        self.fail()
    }

    async fn list_messages(&self, _conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.fail()
    }

    async fn post_message(&self, _conversation_id: &str, _text: &str) -> Result<ChatExchange, ApiError> {
        self.fail()
    }
}
