//! Request mapping between saga-types and the agentic API JSON format.
//!
//! The backend accepts one body shape for both chat and media jobs:
//!
//! ```json
//! {
//!   "messages": [{"role": "user", "content": [{"type": "text", "text": "..."}]}],
//!   "agent": "uncensored-chat"
//! }
//! ```
//!
//! Streaming callers add `"stream": true` themselves.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use saga_types::{ContentPart, Message, Role};

/// Convert messages into the prompt-submission JSON body.
///
/// The returned value does **not** include `"stream"`; callers add that key.
pub fn to_prompt_request(messages: &[Message], agent: &str) -> serde_json::Value {
    serde_json::json!({
        "messages": map_messages(messages),
        "agent": agent,
    })
}

fn map_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|msg| {
            serde_json::json!({
                "role": role_str(&msg.role),
                "content": msg.content.iter().map(map_part).collect::<Vec<_>>(),
            })
        })
        .collect()
}

fn map_part(part: &ContentPart) -> serde_json::Value {
    match part {
        ContentPart::Text(text) => serde_json::json!({
            "type": "text",
            "text": text,
        }),
        ContentPart::ImageUrl { url, filename } => serde_json::json!({
            "type": "image_url",
            "image_url": {
                "url": url,
                "filename": filename,
            },
        }),
    }
}

fn role_str(role: &Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

/// Build a `data:` URI for an image upload.
///
/// The MIME type is guessed from the filename extension; anything that is
/// not PNG falls back to JPEG, matching what the backend expects.
pub fn image_data_uri(bytes: &[u8], filename: &str) -> String {
    format!(
        "data:{};base64,{}",
        mime_for_filename(filename),
        BASE64.encode(bytes)
    )
}

fn mime_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit('.').next().unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        _ => "image/jpeg",
    }
}
