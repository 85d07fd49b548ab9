//! Recover structured JSON from narrative model output.
//!
//! Agents asked for "pure JSON" still wrap it in markdown fences or preface
//! it with prose (or a leaked think span). This strips the fences and pulls
//! the first JSON array of objects out of the text.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(?:json)?").expect("valid regex"));

static ARRAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\{.*\}\s*\]").expect("valid regex"));

/// Extract the first JSON array of objects from free-form model output.
///
/// Returns `None` when the text contains no parseable array.
pub fn json_array(content: &str) -> Option<Vec<serde_json::Value>> {
    if content.is_empty() {
        return None;
    }

    let cleaned = FENCE_RE.replace_all(content, "");
    let candidate = ARRAY_RE.find(&cleaned)?;

    match serde_json::from_str(candidate.as_str().trim()) {
        Ok(items) => Some(items),
        Err(e) => {
            tracing::debug!(error = %e, "extracted array candidate did not parse");
            None
        }
    }
}
