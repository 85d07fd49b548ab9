//! Progress recovery from result-endpoint payloads.
//!
//! Non-terminal result responses rarely carry a clean progress number. The
//! backend buries the real value inside a free-text `log` field that
//! *usually* contains a JSON object of the shape
//! `{"status": {"status": "processing", "progress": 42}}`, but is not
//! guaranteed to stay parseable. Recovery order:
//!
//! 1. embedded JSON object in `log` (`status.progress` / `status.status`),
//! 2. regex scan of `log` for `"progress":<n>` / `"status":"<s>"`,
//! 3. the top-level `progress` field,
//! 4. a heuristic estimate from the attempt count.
//!
//! All of this feeds UI feedback only; it never changes terminal-state
//! handling.

use std::sync::LazyLock;

use regex::Regex;
use saga_types::{JobProgress, JobStatus, QueueInfo};

static PROGRESS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""progress":\s*(\d+)"#).expect("valid regex"));

static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""status":\s*"([^"]+)""#).expect("valid regex"));

/// Build a [`JobProgress`] snapshot from a non-terminal result payload.
pub(crate) fn from_response(
    json: &serde_json::Value,
    status: JobStatus,
    attempt: u32,
) -> JobProgress {
    let (log_percent, log_status) = match json["log"].as_str() {
        Some(log) => parse_log(log),
        None => (None, None),
    };

    // The log's nested status is fresher than the top-level one.
    let status = log_status.map_or(status, |s| JobStatus::parse(&s));

    let percent = log_percent
        .or_else(|| json["progress"].as_u64().map(clamp_percent))
        .unwrap_or_else(|| estimate(&status, attempt));

    let queue_info: Option<QueueInfo> = serde_json::from_value(json["queue_info"].clone()).ok();

    JobProgress {
        status,
        percent,
        queue_info,
        attempt,
    }
}

/// Pull progress/status out of the free-text `log` field.
fn parse_log(log: &str) -> (Option<u8>, Option<String>) {
    // Greedy first-{ to last-} slice, like the original UI code.
    if let Some(start) = log.find('{')
        && let Some(end) = log.rfind('}')
        && start < end
        && let Ok(embedded) = serde_json::from_str::<serde_json::Value>(&log[start..=end])
    {
        let percent = embedded["status"]["progress"].as_u64().map(clamp_percent);
        let status = embedded["status"]["status"].as_str().map(str::to_string);
        if percent.is_some() || status.is_some() {
            return (percent, status);
        }
    }

    // Regex fallback for logs where the embedded object is truncated or
    // interleaved with other output.
    let percent = PROGRESS_RE
        .captures(log)
        .and_then(|c| c[1].parse::<u64>().ok())
        .map(clamp_percent);
    let status = STATUS_RE.captures(log).map(|c| c[1].to_string());
    (percent, status)
}

/// Rough completion estimate when the backend reports no number at all.
fn estimate(status: &JobStatus, attempt: u32) -> u8 {
    let percent = match status {
        JobStatus::Processing => attempt.saturating_mul(2).max(5),
        JobStatus::Queued => 10,
        JobStatus::Pending => 5,
        _ => attempt.saturating_mul(2),
    };
    clamp_percent(u64::from(percent))
}

fn clamp_percent(n: u64) -> u8 {
    n.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_log_json_wins() {
        let json = serde_json::json!({
            "status": "processing",
            "log": "worker 3: {\"status\": {\"status\": \"processing\", \"progress\": 42}} ok",
        });
        let progress = from_response(&json, JobStatus::Processing, 1);
        assert_eq!(progress.percent, 42);
        assert_eq!(progress.status, JobStatus::Processing);
    }

    #[test]
    fn log_status_overrides_top_level_status() {
        let json = serde_json::json!({
            "status": "pending",
            "log": "{\"status\": {\"status\": \"processing\", \"progress\": 10}}",
        });
        let progress = from_response(&json, JobStatus::Pending, 1);
        assert_eq!(progress.status, JobStatus::Processing);
    }

    #[test]
    fn regex_fallback_handles_truncated_log() {
        // Broken JSON: the braces do not parse, but the fields are scannable.
        let json = serde_json::json!({
            "status": "processing",
            "log": "{\"status\":\"processing\",\"progress\":77,...}",
        });
        let progress = from_response(&json, JobStatus::Processing, 1);
        assert_eq!(progress.percent, 77);
    }

    #[test]
    fn top_level_progress_is_used_without_log() {
        let json = serde_json::json!({"status": "processing", "progress": 33});
        let progress = from_response(&json, JobStatus::Processing, 1);
        assert_eq!(progress.percent, 33);
    }

    #[test]
    fn heuristic_estimates_by_status_and_attempt() {
        let empty = serde_json::json!({});
        assert_eq!(from_response(&empty, JobStatus::Pending, 1).percent, 5);
        assert_eq!(from_response(&empty, JobStatus::Queued, 1).percent, 10);
        // Early processing attempts floor at 5 percent.
        assert_eq!(from_response(&empty, JobStatus::Processing, 1).percent, 5);
        assert_eq!(from_response(&empty, JobStatus::Processing, 20).percent, 40);
        // The estimate never exceeds 100.
        assert_eq!(from_response(&empty, JobStatus::Processing, 90).percent, 100);
    }

    #[test]
    fn estimate_survives_huge_attempt_counts() {
        let empty = serde_json::json!({});
        assert_eq!(from_response(&empty, JobStatus::Processing, u32::MAX).percent, 100);
        assert_eq!(
            from_response(&empty, JobStatus::Other("warming_up".into()), u32::MAX).percent,
            100
        );
    }

    #[test]
    fn queue_info_is_passed_through() {
        let json = serde_json::json!({
            "status": "queued",
            "queue_info": {"position": 2, "total": 9},
        });
        let progress = from_response(&json, JobStatus::Queued, 1);
        let info = progress.queue_info.expect("queue info");
        assert_eq!(info.position, Some(2));
        assert_eq!(info.total, Some(9));
    }

    #[test]
    fn reported_percent_is_clamped_to_100() {
        let json = serde_json::json!({"status": "processing", "progress": 250});
        assert_eq!(from_response(&json, JobStatus::Processing, 1).percent, 100);
    }
}
