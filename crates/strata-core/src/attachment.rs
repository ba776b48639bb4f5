//! Attachment materialization
//!
//! Attachments arrive as `data:` URLs or remote URLs. Before generation they
//! are written next to the artifact so the page can reference them by file
//! name. A single bad attachment is skipped with a warning; only storage
//! failures abort the round.

use async_trait::async_trait;
use base64::Engine;
use strata_artifact::{Attachment, TargetId};
use strata_constitutional::{is_safe_attachment_name, ArtifactStore, StorageError};

const DATA_URL_PREFIX: &str = "data:";

/// Failure to obtain an attachment's bytes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttachmentError {
    /// A `data:` URL that cannot be decoded
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// A remote URL that could not be fetched
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// A remote URL with no fetcher configured
    #[error("no fetcher for remote attachment {0}")]
    NoFetcher(String),
}

impl AttachmentError {
    /// Create fetch error from any displayable error
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        Self::Fetch(err.to_string())
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDataUrl(reason.into())
    }
}

/// Downloads remote attachments
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch the body at `url`
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AttachmentError>;
}

/// Decode the payload of a `data:` URL
///
/// Base64 payloads may contain whitespace; anything else is percent-decoded.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, AttachmentError> {
    let rest = url
        .trim()
        .strip_prefix(DATA_URL_PREFIX)
        .ok_or_else(|| AttachmentError::invalid("missing data: prefix"))?;
    let (metadata, data) = rest
        .split_once(',')
        .ok_or_else(|| AttachmentError::invalid("missing comma"))?;

    let is_base64 = metadata
        .split(';')
        .skip(1)
        .any(|param| param.trim().eq_ignore_ascii_case("base64"));
    if is_base64 {
        let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(cleaned)
            .map_err(|e| AttachmentError::invalid(format!("invalid base64: {e}")))
    } else {
        percent_decode(data)
    }
}

fn percent_decode(input: &str) -> Result<Vec<u8>, AttachmentError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes
                .get(i + 1..i + 3)
                .and_then(|pair| std::str::from_utf8(pair).ok())
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| AttachmentError::invalid("bad percent-escape"))?;
            out.push(escape);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Write every usable attachment into the target's directory
///
/// Returns the names written, in input order. Unsafe names, undecodable
/// payloads and failed fetches are skipped.
pub async fn materialize(
    store: &dyn ArtifactStore,
    target: &TargetId,
    attachments: &[Attachment],
    fetcher: Option<&dyn Fetcher>,
) -> Result<Vec<String>, StorageError> {
    let mut written = Vec::with_capacity(attachments.len());
    for attachment in attachments {
        if !is_safe_attachment_name(&attachment.name) {
            tracing::warn!(%target, name = %attachment.name, "skipping attachment with unsafe name");
            continue;
        }
        let bytes = match load(attachment, fetcher).await {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%target, name = %attachment.name, %error, "skipping attachment");
                continue;
            }
        };
        store
            .write_attachment(target, &attachment.name, &bytes)
            .await?;
        tracing::debug!(%target, name = %attachment.name, bytes = bytes.len(), "attachment written");
        written.push(attachment.name.clone());
    }
    Ok(written)
}

async fn load(
    attachment: &Attachment,
    fetcher: Option<&dyn Fetcher>,
) -> Result<Vec<u8>, AttachmentError> {
    if attachment.is_data_url() {
        return decode_data_url(&attachment.url);
    }
    match fetcher {
        Some(fetcher) => fetcher.fetch(&attachment.url).await,
        None => Err(AttachmentError::NoFetcher(attachment.url.clone())),
    }
}
