//! Submit → poll → resolve workflow for asynchronous generation jobs.
//!
//! Media generation is asynchronous: `POST /prompt` returns an opaque
//! `request_id`, and `GET /result` is queried at a fixed interval until the
//! job reaches a terminal state. The poller is stateless per invocation;
//! routing progress updates to UI elements by request id is the caller's
//! concern.

use futures::StreamExt;
use saga_types::{EternalError, JobEvent, JobHandle, JobStatus, Message};
use tokio_util::sync::CancellationToken;

use crate::client::EternalAi;
use crate::error::{map_http_status, map_reqwest_error};
use crate::mapping::to_prompt_request;
use crate::progress;

/// Outcome of one successfully parsed result response.
enum Resolved {
    /// Terminal success with an artifact URL.
    Completed(String),
    /// Terminal failure reported by the backend.
    Failed(String),
    /// Terminal success without any usable URL field.
    MissingUrl,
    /// Non-terminal; keep polling.
    InFlight(saga_types::JobProgress),
}

impl EternalAi {
    /// Submit a generation request and return the backend's job identifier.
    ///
    /// A missing or empty `request_id` in the response is a hard failure;
    /// the submit call is never retried.
    pub async fn submit_generation(
        &self,
        messages: &[Message],
        agent: &str,
    ) -> Result<String, EternalError> {
        self.require_key()?;

        let url = self.prompt_url();
        let body = to_prompt_request(messages, agent);

        tracing::debug!(url = %url, agent = %agent, "submitting generation request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(map_http_status(status, &text));
        }

        let json: serde_json::Value =
            serde_json::from_str(&text).map_err(|e| EternalError::InvalidResponse(e.to_string()))?;

        match json["request_id"].as_str() {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(EternalError::NoRequestId),
        }
    }

    /// Poll a submitted job until it reaches a terminal state.
    ///
    /// Returns a [`JobHandle`] whose receiver yields progress snapshots for
    /// non-terminal statuses and ends with exactly one terminal item:
    /// `Ok(JobEvent::Completed(url))`, or an error for backend failure,
    /// missing result URL, or an exhausted attempt budget. Transport errors
    /// on individual attempts consume an attempt and are retried. Cancelling
    /// the token ends the stream without a terminal item.
    pub fn poll_result(
        &self,
        request_id: &str,
        agent: &str,
        cancel: CancellationToken,
    ) -> JobHandle {
        let url = self.result_url(agent, request_id);
        let api_key = self.api_key.clone();
        let http_client = self.client.clone();
        let interval = self.poll_interval;
        let max_attempts = self.max_poll_attempts;
        let request_id = request_id.to_string();

        let events = async_stream::stream! {
            let mut attempts: u32 = 0;

            loop {
                if attempts >= max_attempts {
                    yield Err(EternalError::Timeout { attempts });
                    return;
                }
                attempts += 1;

                match check_result(&http_client, &url, &api_key, attempts).await {
                    Ok(Resolved::Completed(artifact_url)) => {
                        tracing::debug!(request_id = %request_id, url = %artifact_url, "job completed");
                        yield Ok(JobEvent::Completed(artifact_url));
                        return;
                    }
                    Ok(Resolved::Failed(detail)) => {
                        yield Err(EternalError::GenerationFailed(detail));
                        return;
                    }
                    Ok(Resolved::MissingUrl) => {
                        yield Err(EternalError::MissingResultUrl);
                        return;
                    }
                    Ok(Resolved::InFlight(snapshot)) => {
                        yield Ok(JobEvent::Progress(snapshot));
                    }
                    Err(e) => {
                        // A failed attempt consumes budget but does not end
                        // the workflow.
                        tracing::warn!(request_id = %request_id, error = %e, "poll attempt failed");
                    }
                }

                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
        };

        JobHandle {
            receiver: Box::pin(events),
        }
    }

    /// Submit a request and wait for its artifact URL, discarding progress.
    pub async fn generate(
        &self,
        messages: &[Message],
        agent: &str,
        cancel: CancellationToken,
    ) -> Result<String, EternalError> {
        let request_id = self.submit_generation(messages, agent).await?;
        let mut handle = self.poll_result(&request_id, agent, cancel);

        while let Some(item) = handle.receiver.next().await {
            if let JobEvent::Completed(url) = item? {
                return Ok(url);
            }
        }

        // The stream ended without a terminal item: cancelled.
        Err(EternalError::Cancelled)
    }

    /// Generate an image from a text prompt with the configured image agent.
    pub async fn generate_image(
        &self,
        prompt: &str,
        cancel: CancellationToken,
    ) -> Result<String, EternalError> {
        let messages = vec![Message::user(prompt)];
        let agent = self.image_agent.clone();
        self.generate(&messages, &agent, cancel).await
    }
}

/// Issue one result request and interpret the payload.
async fn check_result(
    http_client: &reqwest::Client,
    url: &str,
    api_key: &str,
    attempt: u32,
) -> Result<Resolved, EternalError> {
    let response = http_client
        .get(url)
        .header("x-api-key", api_key)
        .header("accept", "application/json")
        .send()
        .await
        .map_err(map_reqwest_error)?;

    let status = response.status();
    let text = response.text().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(map_http_status(status, &text));
    }

    let json: serde_json::Value =
        serde_json::from_str(&text).map_err(|e| EternalError::InvalidResponse(e.to_string()))?;

    Ok(interpret(&json, attempt))
}

/// Map a parsed result payload to a [`Resolved`] outcome.
fn interpret(json: &serde_json::Value, attempt: u32) -> Resolved {
    let status = JobStatus::parse(&flatten_status(json));

    match status {
        JobStatus::Success => match first_result_url(json) {
            Some(url) => Resolved::Completed(url),
            None => Resolved::MissingUrl,
        },
        JobStatus::Error => {
            let detail = json["log"]
                .as_str()
                .filter(|s| !s.is_empty())
                .unwrap_or("backend reported error status")
                .to_string();
            Resolved::Failed(detail)
        }
        other => Resolved::InFlight(progress::from_response(json, other, attempt)),
    }
}

/// Read the `status` field, flattening the nested object form
/// `{"status": {"status": "..."}}` one endpoint produces.
fn flatten_status(json: &serde_json::Value) -> String {
    match &json["status"] {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Object(_) => json["status"]["status"]
            .as_str()
            .unwrap_or("unknown")
            .to_string(),
        _ => "unknown".to_string(),
    }
}

/// First populated artifact URL, in backend preference order.
fn first_result_url(json: &serde_json::Value) -> Option<String> {
    ["cdn_url", "result_url", "result_image_url", "result_video_url"]
        .iter()
        .find_map(|field| {
            json[*field]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_prefers_cdn_url() {
        let json = serde_json::json!({
            "status": "success",
            "cdn_url": "https://cdn/img.png",
            "result_url": "https://other/img.png",
        });
        assert!(matches!(
            interpret(&json, 1),
            Resolved::Completed(url) if url == "https://cdn/img.png"
        ));
    }

    #[test]
    fn success_falls_back_through_url_fields() {
        let json = serde_json::json!({
            "status": "success",
            "result_video_url": "https://cdn/clip.mp4",
        });
        assert!(matches!(
            interpret(&json, 1),
            Resolved::Completed(url) if url == "https://cdn/clip.mp4"
        ));
    }

    #[test]
    fn success_with_empty_url_fields_is_missing_url() {
        let json = serde_json::json!({"status": "success", "result_url": ""});
        assert!(matches!(interpret(&json, 1), Resolved::MissingUrl));
    }

    #[test]
    fn error_status_fails_with_log_detail() {
        let json = serde_json::json!({"status": "error", "log": "NSFW filter rejected prompt"});
        assert!(matches!(
            interpret(&json, 1),
            Resolved::Failed(detail) if detail == "NSFW filter rejected prompt"
        ));
    }

    #[test]
    fn unknown_status_keeps_polling() {
        let json = serde_json::json!({"status": "warming_up"});
        assert!(matches!(interpret(&json, 1), Resolved::InFlight(_)));
    }

    #[test]
    fn nested_status_object_is_flattened() {
        let json = serde_json::json!({
            "status": {"status": "success"},
            "result_url": "https://cdn/img.png",
        });
        assert!(matches!(interpret(&json, 1), Resolved::Completed(_)));
    }

    #[test]
    fn missing_status_is_treated_as_unknown() {
        let json = serde_json::json!({"progress": 10});
        assert!(matches!(interpret(&json, 1), Resolved::InFlight(_)));
    }
}
