use url::Url;

use crate::ApiError;

pub const DEFAULT_MAX_COMMENTS: u32 = 500;
pub const MAX_COMMENTS_LIMIT: u32 = 10_000;

/// Validated request for a new analysis job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInput {
    url: String,
    max_comments: u32,
}

impl JobInput {
    /// Builds an input for a Reddit thread, rejecting anything the backend would refuse.
    pub fn new(raw_url: &str) -> Result<Self, ApiError> {
        let trimmed = raw_url.trim();
        let parsed = Url::parse(trimmed)
            .map_err(|err| ApiError::Validation(format!("invalid url: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Validation(format!(
                "unsupported scheme {}",
                parsed.scheme()
            )));
        }
        let host = parsed.host_str().unwrap_or_default().to_ascii_lowercase();
        if !is_reddit_host(&host) {
            return Err(ApiError::Validation("Invalid Reddit URL".to_string()));
        }
        Ok(Self {
            url: trimmed.to_string(),
            max_comments: DEFAULT_MAX_COMMENTS,
        })
    }

    pub fn with_max_comments(mut self, max_comments: u32) -> Result<Self, ApiError> {
        if !(1..=MAX_COMMENTS_LIMIT).contains(&max_comments) {
            return Err(ApiError::Validation(format!(
                "max_comments must be between 1 and {MAX_COMMENTS_LIMIT}"
            )));
        }
        self.max_comments = max_comments;
        Ok(self)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn max_comments(&self) -> u32 {
        self.max_comments
    }
}

fn is_reddit_host(host: &str) -> bool {
    host == "reddit.com" || host.ends_with(".reddit.com") || host == "redd.it"
}
