//! In-memory feed and item model.
//!
//! A [`Feed`] owns its items as a `Vec` of [`ItemRef`] handles. The smart
//! feed holds clones of those same handles, so an item's read flag is a
//! `Cell`: one owner, many views, and marking read through any of them is
//! seen by all.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::hash::item_fingerprint;
use super::parser::ParsedItem;

/// Shared handle to an item. Cloning it never copies item content.
pub type ItemRef = Rc<Item>;

/// Stable identity of a feed within a library.
///
/// Assigned once and never reused, so it stays valid as feeds are sorted
/// or removed around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId(pub u32);

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single headline.
///
/// Content is immutable once built; only the read flag changes.
#[derive(Debug)]
pub struct Item {
    /// Back-reference to the owning feed.
    pub feed: FeedId,
    pub title: Option<String>,
    pub link: Option<String>,
    /// Raw description, still containing markup. Dejunk before display.
    pub description: Option<String>,
    /// Content fingerprint, see [`item_fingerprint`].
    pub hash: String,
    /// Unix seconds.
    pub published: Option<i64>,
    read: Cell<bool>,
}

impl Item {
    pub fn new(feed: FeedId, hash: String) -> Self {
        Self {
            feed,
            title: None,
            link: None,
            description: None,
            hash,
            published: None,
            read: Cell::new(false),
        }
    }

    /// Builds an item from parser output. The guid takes part in the
    /// fingerprint and is then dropped.
    pub fn from_parsed(feed: FeedId, parsed: ParsedItem) -> Self {
        let hash = item_fingerprint(
            parsed.title.as_deref(),
            parsed.link.as_deref(),
            parsed.guid.as_deref(),
        );
        Self {
            feed,
            title: parsed.title,
            link: parsed.link,
            description: parsed.description,
            hash,
            published: parsed.published,
            read: Cell::new(false),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_published(mut self, published: i64) -> Self {
        self.published = Some(published);
        self
    }

    pub fn with_read(self, read: bool) -> Self {
        self.read.set(read);
        self
    }

    pub fn is_read(&self) -> bool {
        self.read.get()
    }

    pub fn set_read(&self, read: bool) {
        self.read.set(read);
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "(untitled)",
        }
    }
}

/// A subscribed feed, or the smart feed.
#[derive(Debug)]
pub struct Feed {
    id: FeedId,
    /// Canonical URL; the key for subscriptions and the cache.
    pub url: String,
    /// Shell command the downloaded body is piped through before parsing.
    pub filter: Option<String>,
    /// User override; wins over `original_title` and survives reloads.
    pub custom_title: Option<String>,
    pub original_title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub(crate) categories: Vec<String>,
    pub(crate) items: Vec<ItemRef>,
    /// Set when the last download or parse failed.
    pub problem: bool,
    smart: bool,
    /// Server `Last-Modified`, sent back as `If-Modified-Since`.
    pub last_modified: Option<i64>,
    /// When the item list was last replaced.
    pub mtime: Option<i64>,
}

impl Feed {
    pub fn new(id: FeedId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            filter: None,
            custom_title: None,
            original_title: None,
            link: None,
            description: None,
            categories: Vec::new(),
            items: Vec::new(),
            problem: false,
            smart: false,
            last_modified: None,
            mtime: None,
        }
    }

    pub(crate) fn new_smart(id: FeedId, url: &str, title: &str) -> Self {
        let mut feed = Self::new(id, url);
        feed.smart = true;
        feed.custom_title = Some(title.to_owned());
        feed
    }

    pub fn id(&self) -> FeedId {
        self.id
    }

    pub fn is_smart(&self) -> bool {
        self.smart
    }

    /// Custom title, then the feed's own title, then the URL.
    pub fn title(&self) -> &str {
        [self.custom_title.as_deref(), self.original_title.as_deref()]
            .into_iter()
            .flatten()
            .find(|t| !t.is_empty())
            .unwrap_or(&self.url)
    }

    /// Category names, case-insensitively sorted, no duplicates.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn has_category(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.categories.iter().any(|c| c.to_lowercase() == name)
    }

    pub fn items(&self) -> &[ItemRef] {
        &self.items
    }

    /// Replaces the item list in one assignment.
    pub(crate) fn set_items(&mut self, items: Vec<ItemRef>) {
        self.items = items;
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_read()).count()
    }

    pub fn mark_all_read(&self) {
        for item in &self.items {
            item.set_read(true);
        }
    }
}
