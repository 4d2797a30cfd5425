use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use verdict_core::{
    ApiError, ChatExchange, ConversationSummary, JobId, JobInput, JobSnapshot, Message,
};
use verdict_logging::verdict_debug;

use crate::api::AnalysisApi;
use crate::wire::{ChatRequest, ChatResponse, ErrorBody, ScrapeRequest, ScrapeTaskResponse, TaskStatusResponse};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub bearer_token: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api/v1".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            bearer_token: None,
        }
    }
}

/// `AnalysisApi` over the backend's JSON HTTP routes.
#[derive(Debug, Clone)]
pub struct HttpAnalysisApi {
    client: reqwest::Client,
    base: Url,
    bearer_token: Option<String>,
}

impl HttpAnalysisApi {
    pub fn new(settings: ClientSettings) -> Result<Self, ApiError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ApiError::Validation(format!("invalid base url: {err}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Validation(format!(
                "base url {} cannot carry a path",
                settings.base_url
            )));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            base,
            bearer_token: settings.bearer_token,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, segments, None).await?;
        decode(&body)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        payload: &B,
    ) -> Result<T, ApiError> {
        let encoded = serde_json::to_vec(payload)
            .map_err(|err| ApiError::Validation(format!("unencodable request: {err}")))?;
        let body = self.execute(Method::POST, segments, Some(encoded)).await?;
        decode(&body)
    }

    async fn execute(
        &self,
        method: Method,
        segments: &[&str],
        payload: Option<Vec<u8>>,
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(segments);
        verdict_debug!("{} {}", method, url);
        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(payload) = payload {
            request = request.header(CONTENT_TYPE, "application/json").body(payload);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(map_reqwest_error);
        settle_response(status, body)
    }
}

#[async_trait::async_trait]
impl AnalysisApi for HttpAnalysisApi {
    async fn submit_job(&self, input: &JobInput) -> Result<JobId, ApiError> {
        let request = ScrapeRequest {
            reddit_url: input.url(),
            max_comments: input.max_comments(),
        };
        let response: ScrapeTaskResponse = self.post_json(&["scrape"], &request).await?;
        Ok(JobId::new(response.task_id))
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ApiError> {
        let response: TaskStatusResponse = self
            .get_json(&["scrape", "status", job_id.as_str()])
            .await?;
        Ok(response.into_snapshot(job_id))
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.get_json(&["chat", "conversations"]).await
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationSummary, ApiError> {
        self.get_json(&["chat", "conversations", conversation_id])
            .await
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        self.get_json(&["chat", "conversations", conversation_id, "messages"])
            .await
    }

    async fn post_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<ChatExchange, ApiError> {
        let request = ChatRequest {
            conversation_id,
            message: text,
        };
        let response: ChatResponse = self.post_json(&["chat"], &request).await?;
        Ok(response.into())
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|err| ApiError::Decode(err.to_string()))
}

/// A non-success status is a server answer even when its body was lost.
fn settle_response(status: StatusCode, body: Result<Vec<u8>, ApiError>) -> Result<Vec<u8>, ApiError> {
    if status.is_success() {
        return body;
    }
    let body = body.unwrap_or_default();
    Err(classify_status(status, &body))
}

/// Maps a response that arrived with a non-success status.
fn classify_status(status: StatusCode, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
        });
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ApiError::Validation(message),
        _ => ApiError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

/// Failures raised before any response arrived.
fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_builder() {
        return ApiError::Validation(format!("invalid request: {err}"));
    }
    if err.is_decode() {
        return ApiError::Decode(err.to_string());
    }
    ApiError::Transport(err.to_string())
}
