//! Core message and generation-job types.

use serde::{Deserialize, Serialize};

/// The role of a message participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A human user.
    User,
    /// An AI assistant.
    Assistant,
    /// A system message.
    System,
}

/// A content part within a message.
///
/// The backend accepts a list of typed parts per message; text prompts and
/// image attachments (as data URIs) are the two shapes the story apps use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentPart {
    /// Plain text content.
    Text(String),
    /// An image reference, usually a `data:` URI for uploads.
    ImageUrl {
        /// Image URL or `data:<mime>;base64,...` URI.
        url: String,
        /// Original filename, passed through to the backend.
        filename: String,
    },
}

/// A chat message: a role plus one or more content parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message.
    pub role: Role,
    /// The message content parts.
    pub content: Vec<ContentPart>,
}

impl Message {
    /// A user message with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    /// A system message with a single text part.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: vec![ContentPart::Text(text.into())],
        }
    }

    /// An assistant message with a single text part.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::Text(text.into())],
        }
    }
}

/// Lifecycle status of an asynchronous generation job.
///
/// The backend reports status as a free-form string; unknown values are kept
/// in [`JobStatus::Other`] and treated as non-terminal so new backend states
/// don't break polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Submitted, not yet picked up.
    Pending,
    /// Actively being generated.
    Processing,
    /// Waiting in the backend queue.
    Queued,
    /// Finished; a result URL should be present.
    Success,
    /// The backend reported a failure.
    Error,
    /// Any other status string, treated as non-terminal.
    Other(String),
}

impl JobStatus {
    /// Parse a backend status string.
    ///
    /// `"failed"` is accepted as a synonym for `"error"`; one backend
    /// endpoint reports it that way.
    pub fn parse(s: &str) -> Self {
        match s {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "queued" => Self::Queued,
            "success" => Self::Success,
            "error" | "failed" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Whether polling must stop at this status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// The status as a displayable string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Queued => "queued",
            Self::Success => "success",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Queue metadata the backend may attach to non-terminal job states.
///
/// All fields are optional; the backend omits the object entirely on most
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueInfo {
    /// Position of this job in the queue.
    #[serde(default)]
    pub position: Option<u32>,
    /// Total number of queued jobs.
    #[serde(default)]
    pub total: Option<u32>,
    /// Backend-estimated wait in seconds.
    #[serde(default)]
    pub estimated_wait_seconds: Option<u64>,
}

/// A progress snapshot for an in-flight generation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobProgress {
    /// Current (possibly refined) job status.
    pub status: JobStatus,
    /// Completion percentage, 0–100. Estimated when the backend reports none.
    pub percent: u8,
    /// Queue metadata, if the backend supplied any.
    pub queue_info: Option<QueueInfo>,
    /// 1-based poll attempt that produced this snapshot.
    pub attempt: u32,
}
