//! Target identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identity of a generation target
///
/// Derived from the task name: lowercased, whitespace runs become `-`, and
/// anything other than ASCII alphanumerics, `-`, `_` and `.` is dropped.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Slug a task name
    #[must_use]
    pub fn from_task(task: &str) -> Self {
        let mut slug = String::with_capacity(task.len());
        let mut pending_dash = false;
        for ch in task.trim().chars() {
            if ch.is_whitespace() {
                pending_dash = !slug.is_empty();
            } else if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
                if pending_dash {
                    slug.push('-');
                    pending_dash = false;
                }
                slug.push(ch.to_ascii_lowercase());
            }
        }
        let slug = slug.trim_start_matches('.').to_string();
        if slug.is_empty() {
            Self("untitled".to_string())
        } else {
            Self(slug)
        }
    }

    /// Slug text
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_task_names() {
        assert_eq!(TargetId::from_task("Todo App").as_str(), "todo-app");
        assert_eq!(TargetId::from_task("  Sum  of Sales ").as_str(), "sum-of-sales");
        assert_eq!(TargetId::from_task("captcha-solver-42").as_str(), "captcha-solver-42");
    }

    #[test]
    fn strips_path_characters() {
        assert_eq!(TargetId::from_task("../etc/passwd").as_str(), "etcpasswd");
        assert_eq!(TargetId::from_task("???").as_str(), "untitled");
    }
}
