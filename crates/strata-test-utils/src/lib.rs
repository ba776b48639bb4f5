//! Testing utilities for Strata workspace
//!
//! In-memory store, scripted generator and page fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use strata_artifact::{RoundRecord, TargetId};
use strata_constitutional::{is_safe_attachment_name, ArtifactStore, StorageError};
use strata_core::{GenerationError, GenerationRequest, Generator};

#[derive(Debug, Default, Clone)]
struct TargetState {
    artifact: Option<String>,
    summary: Option<String>,
    records: Vec<RoundRecord>,
    attachments: HashMap<String, Vec<u8>>,
}

/// Store keeping everything in memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    targets: Mutex<HashMap<TargetId, TargetState>>,
    fail_writes: Mutex<bool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing artifact for a target
    pub fn with_artifact(self, target: &TargetId, html: impl Into<String>) -> Self {
        self.targets
            .lock()
            .entry(target.clone())
            .or_default()
            .artifact = Some(html.into());
        self
    }

    /// Make every write fail from now on
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }

    pub fn artifact(&self, target: &TargetId) -> Option<String> {
        self.targets.lock().get(target).and_then(|t| t.artifact.clone())
    }

    pub fn summary(&self, target: &TargetId) -> Option<String> {
        self.targets.lock().get(target).and_then(|t| t.summary.clone())
    }

    pub fn records(&self, target: &TargetId) -> Vec<RoundRecord> {
        self.targets
            .lock()
            .get(target)
            .map(|t| t.records.clone())
            .unwrap_or_default()
    }

    pub fn attachment(&self, target: &TargetId, name: &str) -> Option<Vec<u8>> {
        self.targets
            .lock()
            .get(target)
            .and_then(|t| t.attachments.get(name).cloned())
    }

    fn check_writable(&self, target: &TargetId) -> Result<(), StorageError> {
        if *self.fail_writes.lock() {
            return Err(StorageError::Task(format!(
                "writes disabled for {target}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for InMemoryStore {
    async fn read_artifact(&self, target: &TargetId) -> Result<Option<String>, StorageError> {
        Ok(self.artifact(target))
    }

    async fn write_artifact(&self, target: &TargetId, html: &str) -> Result<(), StorageError> {
        self.check_writable(target)?;
        self.targets.lock().entry(target.clone()).or_default().artifact = Some(html.to_owned());
        Ok(())
    }

    async fn append_record(
        &self,
        target: &TargetId,
        record: &RoundRecord,
    ) -> Result<(), StorageError> {
        self.check_writable(target)?;
        self.targets
            .lock()
            .entry(target.clone())
            .or_default()
            .records
            .push(record.clone());
        Ok(())
    }

    async fn history(&self, target: &TargetId) -> Result<Vec<RoundRecord>, StorageError> {
        Ok(self.records(target))
    }

    async fn write_summary(&self, target: &TargetId, summary: &str) -> Result<(), StorageError> {
        self.check_writable(target)?;
        self.targets.lock().entry(target.clone()).or_default().summary = Some(summary.to_owned());
        Ok(())
    }

    async fn write_attachment(
        &self,
        target: &TargetId,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        self.check_writable(target)?;
        if !is_safe_attachment_name(name) {
            return Err(StorageError::UnsafeName(name.to_owned()));
        }
        self.targets
            .lock()
            .entry(target.clone())
            .or_default()
            .attachments
            .insert(name.to_owned(), bytes.to_vec());
        Ok(())
    }
}

/// Generator answering from a fixed queue of responses
///
/// An exhausted queue answers [`GenerationError::Empty`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Mutex<VecDeque<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful response
    #[must_use]
    pub fn then_ok(self, text: impl Into<String>) -> Self {
        self.responses.lock().push_back(Ok(text.into()));
        self
    }

    /// Queue a failure
    #[must_use]
    pub fn then_err(self, err: GenerationError) -> Self {
        self.responses.lock().push_back(Err(err));
        self
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .unwrap_or(Err(GenerationError::Empty))
    }
}

/// Full page with the given title, body markup and script
pub fn page(title: &str, body: &str, script: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>{title}</title>\n<style>body {{ margin: 0; }}</style>\n</head>\n<body>\n\
         {body}\n<script>\n{script}\n</script>\n</body>\n</html>\n"
    )
}

/// First-round counter page
pub fn counter_page() -> String {
    page(
        "Counter",
        "<div id=\"counter\"><span id=\"count\">0</span>\
         <button id=\"inc\">+</button></div>",
        "let count = 0;\n\
         function increment() {\n  count += 1;\n  render();\n}\n\n\
         function render() {\n  document.getElementById('count').textContent = count;\n}\n\n\
         document.getElementById('inc').addEventListener('click', increment);",
    )
}

/// Later-round page adding a reset control to [`counter_page`]
pub fn counter_reset_page() -> String {
    page(
        "Counter",
        "<div id=\"controls\"><button id=\"reset\">Reset</button></div>",
        "function reset() {\n  count = 0;\n  render();\n}\n\n\
         document.getElementById('reset').addEventListener('click', reset);",
    )
}
