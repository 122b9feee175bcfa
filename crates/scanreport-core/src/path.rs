//! Slash-separated paths as stored in the search index.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A directory path as the scanner indexed it.
///
/// Index paths are plain strings rather than [`std::path::PathBuf`] because
/// they name entries on the scanned volume, not on the machine producing the
/// report. Repeated separators and a trailing separator are removed on
/// construction so that depth arithmetic stays stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct IndexPath(String);

impl IndexPath {
    /// Create a normalized index path.
    pub fn new(path: impl AsRef<str>) -> Self {
        let raw = path.as_ref();
        let mut normalized = String::with_capacity(raw.len());
        let mut last_was_sep = false;

        for c in raw.chars() {
            if c == '/' {
                if !last_was_sep {
                    normalized.push(c);
                }
                last_was_sep = true;
            } else {
                normalized.push(c);
                last_was_sep = false;
            }
        }

        if normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }

        Self(normalized)
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the path starts at the volume root.
    pub fn is_absolute(&self) -> bool {
        self.0.starts_with('/')
    }

    /// Whether this is the volume root itself.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Number of non-empty segments (`/data/x` has two, `/` has none).
    ///
    /// Walk depth is measured with this count.
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Iterate over the non-empty segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Append one child segment.
    pub fn join(&self, name: &str) -> Self {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return self.clone();
        }
        if self.0.is_empty() {
            Self::new(name)
        } else if self.0.ends_with('/') {
            Self::new(format!("{}{name}", self.0))
        } else {
            Self::new(format!("{}/{name}", self.0))
        }
    }

    /// Parent path, or `None` at the root of an absolute or relative path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() || self.0.is_empty() {
            return None;
        }
        match self.0.rfind('/') {
            Some(0) => Some(Self("/".to_string())),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// This path followed by each of its ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Self> {
        let mut out = vec![self.clone()];
        let mut current = self.parent();
        while let Some(path) = current {
            current = path.parent();
            out.push(path);
        }
        out
    }

    /// Prefix that every strict descendant of this path starts with.
    pub fn descendant_prefix(&self) -> String {
        if self.0.ends_with('/') {
            self.0.clone()
        } else {
            format!("{}/", self.0)
        }
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IndexPath {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for IndexPath {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<IndexPath> for String {
    fn from(value: IndexPath) -> Self {
        value.0
    }
}

impl AsRef<str> for IndexPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
