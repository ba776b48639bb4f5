//! Merge collisions
//!
//! A collision is two definitions for one name or key. It is never an
//! error: the later definition wins and the collision is reported so a
//! caller can trace what a round replaced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of thing collided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionScope {
    /// A named routine
    Routine,
    /// A top-level `const`/`let`/`var` binding
    Binding,
    /// A keyed markup section
    Section,
}

impl CollisionScope {
    /// Lowercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Binding => "binding",
            Self::Section => "section",
        }
    }
}

impl fmt::Display for CollisionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A name or key defined by both the previous artifact and the new round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCollision {
    /// Kind of definition
    pub scope: CollisionScope,
    /// Shared name or section key
    pub key: String,
    /// Both definitions were identical
    pub identical: bool,
    /// For routines: parameter lists match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_signature: Option<bool>,
}

impl MergeCollision {
    /// Collision without signature information
    #[must_use]
    pub fn new(scope: CollisionScope, key: impl Into<String>, identical: bool) -> Self {
        Self {
            scope,
            key: key.into(),
            identical,
            same_signature: None,
        }
    }

    /// Attach signature compatibility
    #[inline]
    #[must_use]
    pub fn with_signature(mut self, same: bool) -> Self {
        self.same_signature = Some(same);
        self
    }

    /// Log at `debug`
    pub(crate) fn trace(&self) {
        tracing::debug!(
            scope = %self.scope,
            key = %self.key,
            identical = self.identical,
            same_signature = ?self.same_signature,
            "definition superseded by new round"
        );
    }
}

impl fmt::Display for MergeCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.scope, self.key)?;
        if self.identical {
            f.write_str(" (identical)")?;
        } else if self.same_signature == Some(false) {
            f.write_str(" (signature changed)")?;
        }
        Ok(())
    }
}
