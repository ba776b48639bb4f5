//! Generation collaborator
//!
//! The core treats generation as an opaque, possibly failing function from
//! a [`GenerationRequest`] to document text. Whatever the generator returns
//! is cleaned and validated here, so every implementation gets the same
//! "usable HTML or failure" contract.

use crate::error::GenerationError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Input to one generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Task name
    pub task: String,
    /// Brief for this round
    pub brief: String,
    /// Round number, starting at 1
    pub round: u32,
    /// Script of the existing artifact, for later rounds
    pub prior_script: Option<String>,
}

impl GenerationRequest {
    /// Request without prior context
    #[must_use]
    pub fn new(task: impl Into<String>, brief: impl Into<String>, round: u32) -> Self {
        Self {
            task: task.into(),
            brief: brief.into(),
            round,
            prior_script: None,
        }
    }

    /// With the existing artifact's script as context
    #[inline]
    #[must_use]
    pub fn with_prior_script(mut self, script: impl Into<String>) -> Self {
        self.prior_script = Some(script.into());
        self
    }

    /// Whether this request builds on an existing artifact
    #[inline]
    #[must_use]
    pub fn is_update(&self) -> bool {
        self.prior_script.is_some()
    }
}

/// Produces full document text for a request
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate document text
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

static LEADING_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^```(?:html|javascript|js)?[ \t]*\r?\n?").expect("invalid fence regex")
});

static TRAILING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r?\n?```\s*$").expect("invalid fence regex"));

static HTML_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<!DOCTYPE html|<html").expect("invalid marker regex"));

/// Strip surrounding whitespace and Markdown code fences
#[must_use]
pub fn clean_output(raw: &str) -> String {
    let text = raw.trim();
    let text = LEADING_FENCE.replace(text, "");
    let text = TRAILING_FENCE.replace(&text, "");
    text.trim().to_owned()
}

/// Clean generator output and check it is an HTML document
pub fn validate_output(raw: &str) -> Result<String, GenerationError> {
    let text = clean_output(raw);
    if text.is_empty() {
        return Err(GenerationError::Empty);
    }
    if !HTML_MARKER.is_match(&text) {
        return Err(GenerationError::NotHtml);
    }
    Ok(text)
}
