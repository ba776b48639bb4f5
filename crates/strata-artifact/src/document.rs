//! Logical regions of a generated HTML artifact
//!
//! A [`Document`] is the decomposed form of an artifact: the shell is not
//! stored, only the four regions that rounds contribute to.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Region of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// `<title>` text
    Title,
    /// Inline `<style>` text
    Style,
    /// `<body>` markup without scripts
    Body,
    /// Inline `<script>` text
    Script,
}

impl Region {
    /// Element that delimits this region
    #[inline]
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Region::Title => "title",
            Region::Style => "style",
            Region::Body => "body",
            Region::Script => "script",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Decomposed artifact: title, style, body markup and script
///
/// # Invariants
/// - Each region is stored exactly once; an absent region is an empty string
/// - Region text never includes its own boundary tags
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Title text (unescaped)
    pub title: String,
    /// Concatenated style text
    pub style: String,
    /// Body markup with scripts lifted out
    pub body: String,
    /// Concatenated script text
    pub script: String,
}

impl Document {
    /// Empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With title
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// With style
    #[inline]
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    /// With body markup
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// With script
    #[inline]
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Text of one region
    #[must_use]
    pub fn region(&self, region: Region) -> &str {
        match region {
            Region::Title => &self.title,
            Region::Style => &self.style,
            Region::Body => &self.body,
            Region::Script => &self.script,
        }
    }

    /// Mutable text of one region
    pub fn region_mut(&mut self, region: Region) -> &mut String {
        match region {
            Region::Title => &mut self.title,
            Region::Style => &mut self.style,
            Region::Body => &mut self.body,
            Region::Script => &mut self.script,
        }
    }

    /// True when every region is blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        [Region::Title, Region::Style, Region::Body, Region::Script]
            .into_iter()
            .all(|r| self.region(r).trim().is_empty())
    }

    /// Hash over all regions, independent of shell formatting
    #[must_use]
    pub fn fingerprint(&self) -> ContentHash {
        let mut hasher = blake3::Hasher::new();
        for region in [Region::Title, Region::Style, Region::Body, Region::Script] {
            let text = self.region(region);
            hasher.update(region.tag().as_bytes());
            hasher.update(&(text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        ContentHash::new(*hasher.finalize().as_bytes())
    }
}
