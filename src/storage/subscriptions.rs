use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::Library;
use crate::util::atomic_write;

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid subscription file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Failed to serialize subscriptions: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// One `[[feed]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub url: String,
    /// Custom title, overriding the feed's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Shell command the download is piped through before parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// The subscription list file, `feeds.toml`:
///
/// ```toml
/// [[feed]]
/// url = "https://example.com/rss"
/// title = "Example"
/// categories = ["news", "tech"]
/// filter = "sed s/foo/bar/"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionList {
    #[serde(default, rename = "feed")]
    pub feeds: Vec<Subscription>,
}

impl SubscriptionList {
    /// Reads the list. A missing file is an empty list.
    pub fn load(path: &Path) -> Result<Self, SubscriptionError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(SubscriptionError::Io {
                    path: path.to_owned(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|source| SubscriptionError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Writes the list atomically, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), SubscriptionError> {
        let content = toml::to_string_pretty(self)?;
        let io_err = |source| SubscriptionError::Io {
            path: path.to_owned(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        atomic_write(path, content.as_bytes()).map_err(io_err)
    }

    /// Snapshot of every real feed in `library`, in library order.
    pub fn from_library(library: &Library) -> Self {
        let feeds = library
            .feeds()
            .iter()
            .filter(|f| !f.is_smart())
            .map(|f| Subscription {
                url: f.url.clone(),
                title: f.custom_title.clone(),
                categories: f.categories().to_vec(),
                filter: f.filter.clone(),
            })
            .collect();
        Self { feeds }
    }

    /// Adds every entry to `library`. Entries that fail (duplicates, empty
    /// category names) are logged and skipped.
    pub fn populate(&self, library: &mut Library) {
        for sub in &self.feeds {
            let id = match library.add_trusted_feed(&sub.url) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(feed = %sub.url, error = %e, "Skipping subscription");
                    continue;
                }
            };
            if let Some(feed) = library.feed_mut(id) {
                feed.custom_title = sub.title.clone();
                feed.filter = sub.filter.clone();
            }
            for name in &sub.categories {
                if let Err(e) = library.tag_feed(id, name) {
                    tracing::warn!(feed = %sub.url, category = %name, error = %e, "Skipping category");
                }
            }
        }
    }
}
