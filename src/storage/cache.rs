use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::feed::{fingerprint, Feed, Item, ItemRef};
use crate::util::atomic_write;

const CACHE_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cache file {path} has unsupported version {version}")]
    Version { path: PathBuf, version: u32 },
}

/// On-disk form of one feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedFeed {
    pub version: u32,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub last_modified: Option<i64>,
    #[serde(default)]
    pub mtime: Option<i64>,
    #[serde(default)]
    pub items: Vec<CachedItem>,
}

/// On-disk form of one item. The guid is not kept: the stored hash already
/// covers it and is reused as-is on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hash: String,
    #[serde(default)]
    pub published: Option<i64>,
    #[serde(default)]
    pub read: bool,
}

impl CachedFeed {
    pub fn from_feed(feed: &Feed) -> Self {
        Self {
            version: CACHE_VERSION,
            url: feed.url.clone(),
            title: feed.original_title.clone(),
            link: feed.link.clone(),
            description: feed.description.clone(),
            last_modified: feed.last_modified,
            mtime: feed.mtime,
            items: feed
                .items()
                .iter()
                .map(|item| CachedItem {
                    title: item.title.clone(),
                    link: item.link.clone(),
                    description: item.description.clone(),
                    hash: item.hash.clone(),
                    published: item.published,
                    read: item.is_read(),
                })
                .collect(),
        }
    }

    /// Loads the cached state into `feed`, replacing its items.
    pub fn restore_into(self, feed: &mut Feed) {
        let id = feed.id();
        let items: Vec<ItemRef> = self
            .items
            .into_iter()
            .map(|cached| {
                let mut item = Item::new(id, cached.hash).with_read(cached.read);
                item.title = cached.title;
                item.link = cached.link;
                item.description = cached.description;
                item.published = cached.published;
                Rc::new(item)
            })
            .collect();

        feed.set_items(items);
        feed.original_title = self.title;
        feed.link = self.link;
        feed.description = self.description;
        feed.last_modified = self.last_modified;
        feed.mtime = self.mtime;
    }
}

/// File name stem for a feed's cache: the SHA-256 hex of its URL.
pub fn cache_key(url: &str) -> String {
    fingerprint(&[Some(url)])
}

/// One JSON file per feed under a cache directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(url)))
    }

    /// Writes `feed` atomically. The smart feed owns nothing and is skipped.
    pub fn save(&self, feed: &Feed) -> Result<(), CacheError> {
        if feed.is_smart() {
            return Ok(());
        }
        let path = self.path_for(&feed.url);
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let json = serde_json::to_vec(&CachedFeed::from_feed(feed)).map_err(|source| {
            CacheError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        atomic_write(&path, &json).map_err(io_err)?;

        tracing::debug!(feed = %feed.url, items = feed.items().len(), "Cached");
        Ok(())
    }

    /// Reads the cache for `url`. A missing file is `Ok(None)`.
    pub fn load(&self, url: &str) -> Result<Option<CachedFeed>, CacheError> {
        let path = self.path_for(url);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let cached: CachedFeed = serde_json::from_slice(&bytes)
            .map_err(|source| CacheError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if cached.version != CACHE_VERSION {
            return Err(CacheError::Version {
                path,
                version: cached.version,
            });
        }
        if cached.url != url {
            tracing::warn!(feed = %url, cached = %cached.url, "Cache file belongs to another feed");
            return Ok(None);
        }
        Ok(Some(cached))
    }

    /// Loads the cache for `feed` into it. Returns whether anything was found.
    pub fn restore(&self, feed: &mut Feed) -> Result<bool, CacheError> {
        match self.load(&feed.url)? {
            Some(cached) => {
                cached.restore_into(feed);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove(&self, url: &str) -> Result<(), CacheError> {
        let path = self.path_for(url);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }
}
