//! Files supplied with a round

use serde::{Deserialize, Serialize};

/// A named file given by URL, either `data:` or remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// File name it is stored under
    pub name: String,
    /// `data:` URL or remote URL
    pub url: String,
}

impl Attachment {
    /// Create attachment
    #[must_use]
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Parse `name=url`, or a bare remote URL named after its last path
    /// segment
    ///
    /// A bare `data:` URL has no name and yields `None`.
    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if let Some((name, url)) = spec.split_once('=') {
            if !name.is_empty() && !name.contains([':', '/']) {
                return Some(Self::new(name, url));
            }
        }
        if spec.starts_with("data:") {
            return None;
        }
        let path = spec.split(['?', '#']).next().unwrap_or(spec);
        let name = path.rsplit('/').next().filter(|n| !n.is_empty() && !n.contains(':'))?;
        Some(Self::new(name, spec))
    }

    /// Whether the content is inline in the URL
    #[inline]
    #[must_use]
    pub fn is_data_url(&self) -> bool {
        self.url.trim_start().starts_with("data:")
    }
}
