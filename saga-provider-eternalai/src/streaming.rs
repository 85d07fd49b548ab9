//! SSE stream decoding with `<think>`-span filtering.
//!
//! The streaming chat endpoint produces a body of `data: <json>\n` lines
//! terminated by `data: [DONE]` or stream close. Each JSON payload carries a
//! text delta in one of three shapes; the delta may contain `<think>` spans
//! that must not reach the visible output. This module reassembles lines
//! across arbitrary chunk splits, extracts the deltas, and splits them into
//! visible and thinking text.

use futures::{Stream, StreamExt};
use saga_types::{StreamEvent, StreamHandle};

/// Wrap an HTTP response body into a [`StreamHandle`] that emits
/// [`StreamEvent`]s.
pub(crate) fn decode_response(response: reqwest::Response) -> StreamHandle {
    let byte_stream = response.bytes_stream();
    StreamHandle {
        receiver: Box::pin(decode_stream(byte_stream)),
    }
}

/// Decode a raw byte stream into a stream of [`StreamEvent`]s.
///
/// The stream ends when the underlying byte stream ends. A transport error
/// yields a final [`StreamEvent::Error`]; text already emitted remains
/// valid.
pub fn decode_stream(
    byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
) -> impl Stream<Item = StreamEvent> + Send + 'static {
    async_stream::stream! {
        let mut decoder = SseDecoder::new();
        let mut bytes_stream = std::pin::pin!(byte_stream);

        while let Some(chunk_result) = bytes_stream.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield StreamEvent::Error(format!("stream read error: {e}"));
                    return;
                }
            };

            match decoder.push_chunk(&chunk) {
                Ok(events) => {
                    for event in events {
                        yield event;
                    }
                }
                Err(msg) => {
                    yield StreamEvent::Error(msg);
                    return;
                }
            }
        }

        for event in decoder.finish() {
            yield event;
        }
    }
}

/// Incremental SSE decoder.
///
/// Holds all cross-chunk state: an undecoded UTF-8 byte carry, the
/// carry-over line buffer, and the think-span flag (which must survive
/// frame and line boundaries, not just chunk boundaries).
pub struct SseDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    utf8_carry: Vec<u8>,
    /// Carry-over buffer holding the trailing incomplete line.
    line_buf: String,
    /// Think-span filter state.
    filter: ThinkFilter,
}

impl SseDecoder {
    /// Create a decoder with empty buffers, outside any think span.
    pub fn new() -> Self {
        Self {
            utf8_carry: Vec::new(),
            line_buf: String::new(),
            filter: ThinkFilter::new(),
        }
    }

    /// Feed one transport chunk and collect the events it completes.
    ///
    /// Only invalid (not merely incomplete) UTF-8 is an error; an incomplete
    /// trailing sequence is carried into the next chunk.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Vec<StreamEvent>, String> {
        let mut bytes = std::mem::take(&mut self.utf8_carry);
        bytes.extend_from_slice(chunk);

        let valid_len = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(e) if e.error_len().is_none() => {
                // Incomplete trailing sequence: decode the valid prefix,
                // carry the rest.
                e.valid_up_to()
            }
            Err(e) => {
                return Err(format!("UTF-8 decode error: {e}"));
            }
        };

        self.utf8_carry = bytes.split_off(valid_len);
        // Length was validated above.
        let text = String::from_utf8(bytes).map_err(|e| format!("UTF-8 decode error: {e}"))?;
        self.line_buf.push_str(&text);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.line_buf.find('\n') {
            let line = self.line_buf[..newline_pos]
                .trim_end_matches('\r')
                .to_string();
            self.line_buf.drain(..=newline_pos);
            self.process_line(&line, &mut events);
        }
        Ok(events)
    }

    /// Flush the carry-over buffer at end of stream.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.line_buf.trim().is_empty() {
            let line = std::mem::take(&mut self.line_buf);
            self.process_line(line.trim_end_matches('\r'), &mut events);
        }
        events
    }

    /// Process one complete line.
    ///
    /// Lines without the `data: ` prefix and the `[DONE]` sentinel
    /// contribute nothing. Malformed JSON payloads are dropped without
    /// aborting the stream.
    fn process_line(&mut self, line: &str, events: &mut Vec<StreamEvent>) {
        let Some(payload) = line.strip_prefix("data: ") else {
            return;
        };

        if payload.trim() == "[DONE]" {
            return;
        }

        let json: serde_json::Value = match serde_json::from_str(payload) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed stream line");
                return;
            }
        };

        let Some(delta) = extract_delta(&json) else {
            return;
        };

        let (visible, thinking) = self.filter.split(delta);
        if !visible.is_empty() {
            events.push(StreamEvent::TextDelta(visible));
        }
        if !thinking.is_empty() {
            events.push(StreamEvent::ThinkingDelta(thinking));
        }
    }
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the text delta from a stream payload.
///
/// The backend emits three payload shapes depending on the agent; first
/// non-empty match wins: `content`, `choices[0].delta.content`,
/// `delta.content`.
fn extract_delta(json: &serde_json::Value) -> Option<&str> {
    if let Some(content) = json["content"].as_str()
        && !content.is_empty()
    {
        return Some(content);
    }

    if let Some(choices) = json["choices"].as_array()
        && let Some(choice) = choices.first()
        && let Some(content) = choice["delta"]["content"].as_str()
        && !content.is_empty()
    {
        return Some(content);
    }

    if let Some(content) = json["delta"]["content"].as_str()
        && !content.is_empty()
    {
        return Some(content);
    }

    None
}

/// Splits deltas into visible and thinking text around `<think>` spans.
///
/// Spans are non-nesting: the first `<think>` opens a span, the first
/// `</think>` after it closes it. The inside-span flag persists across
/// deltas, so a span opened in one frame keeps swallowing text in the
/// next. An unterminated span captures everything to stream end.
struct ThinkFilter {
    inside: bool,
}

impl ThinkFilter {
    fn new() -> Self {
        Self { inside: false }
    }

    /// Split one delta into (visible, thinking), dropping the markers.
    fn split(&mut self, delta: &str) -> (String, String) {
        let mut visible = String::new();
        let mut thinking = String::new();

        let mut i = 0;
        while i < delta.len() {
            let rest = &delta[i..];

            if !self.inside && rest.starts_with("<think>") {
                self.inside = true;
                i += "<think>".len();
                continue;
            }

            if self.inside && rest.starts_with("</think>") {
                self.inside = false;
                i += "</think>".len();
                continue;
            }

            let Some(ch) = rest.chars().next() else {
                break;
            };
            if self.inside {
                thinking.push(ch);
            } else {
                visible.push(ch);
            }
            i += ch.len_utf8();
        }

        (visible, thinking)
    }
}
