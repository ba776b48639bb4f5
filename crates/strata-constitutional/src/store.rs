//! Artifact storage
//!
//! [`ArtifactStore`] is the collaborator that holds each target's current
//! artifact, its summary and its append-only round history. [`FsStore`]
//! keeps one directory per target:
//!
//! ```text
//! <root>/<target>/index.html    current artifact (atomically replaced)
//! <root>/<target>/README.md     summary of the latest round
//! <root>/<target>/rounds.jsonl  one RoundRecord per line
//! <root>/<target>/<attachment>  files supplied with a round
//! ```

use crate::error::StorageError;
use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};
use strata_artifact::{RoundRecord, TargetId};
use tokio::io::AsyncWriteExt;

/// Artifact file name
pub const ARTIFACT_FILE: &str = "index.html";
/// Summary file name
pub const SUMMARY_FILE: &str = "README.md";
/// History file name
pub const HISTORY_FILE: &str = "rounds.jsonl";

/// Whether `name` can be stored as an attachment file
///
/// A plain file name: no separators, no leading dot, and none of the names
/// the store manages itself.
#[must_use]
pub fn is_safe_attachment_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(&['/', '\\', '\0'][..])
        && ![ARTIFACT_FILE, SUMMARY_FILE, HISTORY_FILE].contains(&name)
}

/// Storage for artifacts, summaries and round history
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Current artifact text, `None` when the target has none yet
    async fn read_artifact(&self, target: &TargetId) -> Result<Option<String>, StorageError>;

    /// Replace the artifact; readers never observe a partial write
    async fn write_artifact(&self, target: &TargetId, html: &str) -> Result<(), StorageError>;

    /// Append one round record to the target's history
    async fn append_record(
        &self,
        target: &TargetId,
        record: &RoundRecord,
    ) -> Result<(), StorageError>;

    /// All round records, oldest first
    async fn history(&self, target: &TargetId) -> Result<Vec<RoundRecord>, StorageError>;

    /// Replace the human-readable summary
    async fn write_summary(&self, target: &TargetId, summary: &str) -> Result<(), StorageError>;

    /// Store a file supplied with a round next to the artifact
    async fn write_attachment(
        &self,
        target: &TargetId,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError>;
}

/// Filesystem store rooted at a workspace directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Store rooted at `root`; directories are created on first write
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Workspace root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one target's files
    #[must_use]
    pub fn target_dir(&self, target: &TargetId) -> PathBuf {
        self.root.join(target.as_str())
    }

    /// Path of a target's artifact
    #[must_use]
    pub fn artifact_path(&self, target: &TargetId) -> PathBuf {
        self.target_dir(target).join(ARTIFACT_FILE)
    }

    async fn ensure_dir(&self, target: &TargetId) -> Result<PathBuf, StorageError> {
        let dir = self.target_dir(target);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| StorageError::io(&dir, e))?;
        Ok(dir)
    }

    /// Write through a temp file in the same directory, then rename over
    async fn replace_file(&self, dir: PathBuf, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = dir.join(name);
        let bytes = bytes.to_vec();
        let written = path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
            let mut tmp =
                tempfile::NamedTempFile::new_in(&dir).map_err(|e| StorageError::io(&dir, e))?;
            tmp.write_all(&bytes)
                .and_then(|()| tmp.as_file().sync_all())
                .map_err(|e| StorageError::io(tmp.path(), e))?;
            tmp.persist(&path)
                .map_err(|e| StorageError::io(&path, e.error))?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))??;
        tracing::debug!(path = %written.display(), "file replaced");
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    async fn read_artifact(&self, target: &TargetId) -> Result<Option<String>, StorageError> {
        let path = self.artifact_path(target);
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    async fn write_artifact(&self, target: &TargetId, html: &str) -> Result<(), StorageError> {
        let dir = self.ensure_dir(target).await?;
        self.replace_file(dir, ARTIFACT_FILE, html.as_bytes()).await
    }

    async fn append_record(
        &self,
        target: &TargetId,
        record: &RoundRecord,
    ) -> Result<(), StorageError> {
        let dir = self.ensure_dir(target).await?;
        let path = dir.join(HISTORY_FILE);
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| StorageError::io(&path, e))?;
        file.flush().await.map_err(|e| StorageError::io(&path, e))?;
        Ok(())
    }

    async fn history(&self, target: &TargetId) -> Result<Vec<RoundRecord>, StorageError> {
        let path = self.target_dir(target).join(HISTORY_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::io(path, e)),
        };

        text.lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line)
                    .map_err(|e| StorageError::corrupt_record(&path, i + 1, e))
            })
            .collect()
    }

    async fn write_summary(&self, target: &TargetId, summary: &str) -> Result<(), StorageError> {
        let dir = self.ensure_dir(target).await?;
        self.replace_file(dir, SUMMARY_FILE, summary.as_bytes()).await
    }

    async fn write_attachment(
        &self,
        target: &TargetId,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        if !is_safe_attachment_name(name) {
            return Err(StorageError::UnsafeName(name.to_owned()));
        }
        let dir = self.ensure_dir(target).await?;
        self.replace_file(dir, name, bytes).await
    }
}
