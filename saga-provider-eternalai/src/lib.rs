//! EternalAI agentic generation API client for the saga story apps.
//!
//! This crate factors out the two pieces of logic every saga front-end
//! needs:
//!
//! - a **stream decoder** that turns the `data: <json>` SSE body of a
//!   streaming chat response into incremental visible text, filtering
//!   `<think>` spans out (and capturing them separately), and
//! - an **async job poller** that drives the submit → poll → resolve
//!   workflow for image/video generation.
//!
//! # Usage
//!
//! ```no_run
//! use saga_provider_eternalai::EternalAi;
//!
//! let client = EternalAi::new("your-api-key")
//!     .agent("uncensored-chat")
//!     .image_agent("uncensored-imagine");
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod mapping;
pub mod poll;
pub mod progress;
pub mod streaming;

pub use client::EternalAi;
pub use config::AppConfig;

// Re-export saga-types for convenience
pub use saga_types::{EternalError, JobEvent, JobHandle, StreamEvent, StreamHandle};
