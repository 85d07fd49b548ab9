//! EternalAI API client struct and builder.

use std::time::Duration;

use saga_types::{EternalError, Message, StreamHandle};

use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::to_prompt_request;
use crate::streaming::decode_response;

/// Default host for prompt submission (chat and media jobs).
const DEFAULT_PROMPT_BASE: &str = "https://agentic.eternalai.org";

/// Default host for job result polling.
const DEFAULT_RESULT_BASE: &str = "https://agent-api.eternalai.org";

/// Default agent for streaming chat.
const DEFAULT_CHAT_AGENT: &str = "uncensored-chat";

/// Default agent for image generation jobs.
const DEFAULT_IMAGE_AGENT: &str = "uncensored-imagine";

/// Fixed delay between poll attempts.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Poll attempt budget (5 minutes at the default interval).
const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 60;

/// Client for the EternalAI agentic generation API.
///
/// The submit and result endpoints live on different hosts, so the client
/// keeps two base URLs. Both are overridable for testing or proxy setups.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use saga_provider_eternalai::EternalAi;
///
/// let client = EternalAi::new("sk-...")
///     .agent("uncensored-chat")
///     .image_agent("uncensored-imagine")
///     .poll_interval(Duration::from_secs(5))
///     .max_poll_attempts(120);
/// ```
pub struct EternalAi {
    /// API key, sent as the `x-api-key` header.
    pub(crate) api_key: String,
    /// Base URL for `POST /prompt`.
    pub(crate) prompt_base: String,
    /// Base URL for `GET /result`.
    pub(crate) result_base: String,
    /// Agent used for streaming chat.
    pub(crate) agent: String,
    /// Agent used for image generation jobs.
    pub(crate) image_agent: String,
    /// Fixed delay between poll attempts.
    pub(crate) poll_interval: Duration,
    /// Maximum number of poll attempts before timing out.
    pub(crate) max_poll_attempts: u32,
    /// Shared HTTP client.
    pub(crate) client: reqwest::Client,
}

impl EternalAi {
    /// Create a new client with the given API key and production defaults.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            prompt_base: DEFAULT_PROMPT_BASE.into(),
            result_base: DEFAULT_RESULT_BASE.into(),
            agent: DEFAULT_CHAT_AGENT.into(),
            image_agent: DEFAULT_IMAGE_AGENT.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            client: reqwest::Client::new(),
        }
    }

    /// Override the prompt-submission base URL.
    ///
    /// Useful for testing with a local mock server or an API proxy.
    pub fn prompt_base(mut self, url: impl Into<String>) -> Self {
        self.prompt_base = url.into();
        self
    }

    /// Override the result-polling base URL.
    pub fn result_base(mut self, url: impl Into<String>) -> Self {
        self.result_base = url.into();
        self
    }

    /// Override the chat agent.
    pub fn agent(mut self, agent: impl Into<String>) -> Self {
        self.agent = agent.into();
        self
    }

    /// Override the image-generation agent.
    pub fn image_agent(mut self, agent: impl Into<String>) -> Self {
        self.image_agent = agent.into();
        self
    }

    /// Override the fixed delay between poll attempts.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the poll attempt budget.
    ///
    /// The heavier story-generator workflow uses 120 (10 minutes) instead
    /// of the default 60.
    pub fn max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = attempts;
        self
    }

    /// Build the prompt-submission endpoint URL.
    pub(crate) fn prompt_url(&self) -> String {
        format!("{}/prompt", self.prompt_base)
    }

    /// Build the result endpoint URL for a given agent and job.
    pub(crate) fn result_url(&self, agent: &str, request_id: &str) -> String {
        format!(
            "{}/result?agent={agent}&request_id={request_id}",
            self.result_base
        )
    }

    /// Fail fast when no API key is configured. No request is sent.
    pub(crate) fn require_key(&self) -> Result<(), EternalError> {
        if self.api_key.trim().is_empty() {
            return Err(EternalError::MissingCredential);
        }
        Ok(())
    }

    /// Start a streaming chat request with the configured chat agent.
    ///
    /// Returns a [`StreamHandle`] whose receiver emits visible text deltas
    /// (with `<think>` spans filtered out) and captured thinking deltas as
    /// the model generates. See [`crate::streaming`] for the decode rules.
    pub async fn chat_stream(&self, messages: &[Message]) -> Result<StreamHandle, EternalError> {
        self.require_key()?;

        let url = self.prompt_url();
        let mut body = to_prompt_request(messages, &self.agent);
        body["stream"] = serde_json::Value::Bool(true);

        tracing::debug!(url = %url, agent = %self.agent, "starting streaming chat request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.map_err(map_reqwest_error)?;
            return Err(map_http_status(status, &body_text));
        }

        Ok(decode_response(response))
    }
}
