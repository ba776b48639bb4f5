//! Strata LLM - chat-completions generator
//!
//! [`OpenAiGenerator`] implements [`strata_core::Generator`] against any
//! OpenAI-compatible `/chat/completions` endpoint. [`HttpFetcher`]
//! downloads remote attachments.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod client;
mod fetch;
pub mod prompt;
mod wire;

pub use client::OpenAiGenerator;
pub use fetch::{HttpFetcher, FETCH_TIMEOUT};
pub use prompt::{user_prompt, SYSTEM_PROMPT};
