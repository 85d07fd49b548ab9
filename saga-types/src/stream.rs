//! Streaming event types for incremental chat responses and job polling.

use std::pin::Pin;

use futures::Stream;

use crate::error::EternalError;
use crate::types::JobProgress;

/// An event emitted while decoding a streaming chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Incremental visible text, ready to append to the rendered output.
    TextDelta(String),
    /// Incremental `<think>`-span content, captured for optional display
    /// as a collapsible aside. Never part of the visible text.
    ThinkingDelta(String),
    /// The transport failed mid-stream. Text already emitted remains valid;
    /// no further events follow.
    Error(String),
}

/// Handle to a streaming chat response.
pub struct StreamHandle {
    /// The stream of events. Consume with `StreamExt::next()`.
    pub receiver: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
}

/// An event emitted while polling an asynchronous generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    /// A non-terminal progress snapshot.
    Progress(JobProgress),
    /// The job succeeded; carries the artifact URL.
    Completed(String),
}

/// Handle to an in-flight generation job.
///
/// The stream yields zero or more `Ok(JobEvent::Progress(..))` items followed
/// by exactly one terminal item, `Ok(JobEvent::Completed(url))` or `Err(..)`,
/// after which it ends and the job is never queried again. Cancellation
/// ends the stream without a terminal item.
pub struct JobHandle {
    /// The stream of job events. Consume with `StreamExt::next()`.
    pub receiver: Pin<Box<dyn Stream<Item = Result<JobEvent, EternalError>> + Send>>,
}
