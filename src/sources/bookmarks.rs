//! Bookmarked playlist URLs.
//!
//! The bookmark file is a JSON object. Either every value is a URL
//! (`{"name": "url"}`), or values are categories holding such maps
//! (`{"bookmark": {...}, "completed": {...}}`). Both may be mixed.

use crate::error::{Result, TrackerError};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Set of bookmarked playlist URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    urls: HashSet<String>,
}

impl Bookmarks {
    /// Load and parse the bookmark file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Bookmarks`] if the file cannot be read or is
    /// not a JSON object.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            TrackerError::Bookmarks(format!("cannot read {}: {e}", path.display()))
        })?;
        let bookmarks = Self::from_json(&content)?;
        debug!(path = %path.display(), count = bookmarks.len(), "bookmarks loaded");
        Ok(bookmarks)
    }

    /// Parse bookmark JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Bookmarks`] for invalid JSON or a non-object
    /// root.
    pub fn from_json(json: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| TrackerError::Bookmarks(format!("invalid bookmark JSON: {e}")))?;
        let serde_json::Value::Object(entries) = root else {
            return Err(TrackerError::Bookmarks(
                "bookmark file must contain a JSON object".to_owned(),
            ));
        };

        let mut urls = HashSet::new();
        for (name, value) in entries {
            match value {
                serde_json::Value::String(url) => {
                    urls.insert(url);
                }
                serde_json::Value::Object(category) => {
                    urls.extend(category.into_iter().filter_map(|(_, v)| match v {
                        serde_json::Value::String(url) => Some(url),
                        _ => None,
                    }));
                }
                _ => debug!(entry = %name, "ignoring non-URL bookmark entry"),
            }
        }
        Ok(Self { urls })
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl FromIterator<String> for Bookmarks {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().collect(),
        }
    }
}
