//! The reader's in-memory state: feeds, categories, active filters and the
//! smart feed, held in one context object that callers pass around.
//!
//! Feeds live in a `Vec` and are addressed by [`FeedId`], which survives
//! sorting and removal. Filtered lists are [`FeedView`]s over that `Vec`, so
//! clearing a filter hands back the canonical list itself.

mod categories;
mod filter;
mod smart;

use std::rc::Rc;

use thiserror::Error;

pub use categories::{sanitize_category_name, same_name, Category, CategoryRegistry};
pub use filter::{FeedView, FilterError, FilterMode, FilterSet, MAX_FILTERS};
pub use smart::{collect_unread, SMART_FEED_TITLE, SMART_FEED_URL};

use crate::content::{Dejunker, EntityTable};
use crate::feed::{merge, Feed, FeedId, MergeOutcome, ParseError, ParsedFeed};
use crate::util::{validate_local_url, validate_url, UrlValidationError};

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Already subscribed to {0}")]
    DuplicateFeed(String),
    #[error("No feed {0}")]
    UnknownFeed(FeedId),
    #[error(transparent)]
    InvalidUrl(#[from] UrlValidationError),
    #[error("Category name cannot be empty")]
    EmptyCategory,
    #[error("The smart feed cannot be changed this way")]
    SmartFeed,
    #[error(transparent)]
    Filter(#[from] FilterError),
    #[error("Parse failed: {0}")]
    Parse(#[from] ParseError),
}

/// Feeds plus everything that is global to them.
#[derive(Debug, Default)]
pub struct Library {
    feeds: Vec<Feed>,
    categories: CategoryRegistry,
    filters: FilterSet,
    entities: EntityTable,
    next_id: u32,
}

impl Library {
    pub fn new(entities: EntityTable) -> Self {
        Self {
            entities,
            ..Self::default()
        }
    }

    fn allocate_id(&mut self) -> FeedId {
        self.next_id += 1;
        FeedId(self.next_id)
    }

    /// Canonical feed list, in display order.
    pub fn feeds(&self) -> &[Feed] {
        &self.feeds
    }

    pub fn feed(&self, id: FeedId) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.id() == id)
    }

    pub fn feed_mut(&mut self, id: FeedId) -> Option<&mut Feed> {
        self.feeds.iter_mut().find(|f| f.id() == id)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&Feed> {
        let url = url.trim();
        self.feeds.iter().find(|f| f.url == url)
    }

    fn position(&self, id: FeedId) -> Result<usize, LibraryError> {
        self.feeds
            .iter()
            .position(|f| f.id() == id)
            .ok_or(LibraryError::UnknownFeed(id))
    }

    fn real_feed_mut(&mut self, id: FeedId) -> Result<&mut Feed, LibraryError> {
        let idx = self.position(id)?;
        let feed = &mut self.feeds[idx];
        if feed.is_smart() {
            return Err(LibraryError::SmartFeed);
        }
        Ok(feed)
    }

    /// Subscribes to `url` after validating it.
    pub fn add_feed(&mut self, url: &str) -> Result<FeedId, LibraryError> {
        validate_url(url)?;
        self.add_trusted_feed(url)
    }

    /// Subscribes to `url`, which may point at a loopback or private host.
    pub fn add_local_feed(&mut self, url: &str) -> Result<FeedId, LibraryError> {
        validate_local_url(url)?;
        self.add_trusted_feed(url)
    }

    /// Subscribes to `url` without validation. For URLs from the user's own
    /// subscription file, which may legitimately point at a local server.
    pub fn add_trusted_feed(&mut self, url: &str) -> Result<FeedId, LibraryError> {
        let url = url.trim();
        if self.find_by_url(url).is_some() {
            return Err(LibraryError::DuplicateFeed(url.to_owned()));
        }
        let id = self.allocate_id();
        self.feeds.push(Feed::new(id, url));
        tracing::debug!(feed = %url, id = %id, "Subscribed");
        Ok(id)
    }

    /// Unsubscribes. The feed's category references are released and the
    /// smart feed is rebuilt so it holds none of the removed items.
    pub fn remove_feed(&mut self, id: FeedId) -> Result<Feed, LibraryError> {
        let idx = self.position(id)?;
        if self.feeds[idx].is_smart() {
            return Err(LibraryError::SmartFeed);
        }
        let feed = self.feeds.remove(idx);

        for name in feed.categories() {
            if self.categories.release(name) {
                self.filters.deactivate(name);
            }
        }
        self.rebuild_smart_feed();

        tracing::debug!(feed = %feed.url, id = %id, "Unsubscribed");
        Ok(feed)
    }

    /// Adds category `name` to a feed. Returns `false` if the feed already
    /// had it.
    pub fn tag_feed(&mut self, id: FeedId, name: &str) -> Result<bool, LibraryError> {
        let name = sanitize_category_name(name).ok_or(LibraryError::EmptyCategory)?;
        // Reuse the registry's spelling so a name is written one way everywhere
        let name = match self.categories.get(&name) {
            Some(existing) => existing.name.clone(),
            None => name,
        };

        let feed = self.real_feed_mut(id)?;
        if !categories::insert_sorted(&mut feed.categories, &name) {
            return Ok(false);
        }
        self.categories.acquire(&name);
        Ok(true)
    }

    /// Removes category `name` from a feed. Returns `false` if the feed did
    /// not have it. A category no feed carries any more leaves the registry
    /// and any active filter on it is dropped.
    pub fn untag_feed(&mut self, id: FeedId, name: &str) -> Result<bool, LibraryError> {
        let feed = self.real_feed_mut(id)?;
        let Some(stored) = categories::remove_name(&mut feed.categories, name) else {
            return Ok(false);
        };
        if self.categories.release(&stored) {
            self.filters.deactivate(&stored);
        }
        Ok(true)
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn set_category_color(&mut self, name: &str, color: impl Into<String>) {
        self.categories.set_color(name, color);
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn toggle_filter(&mut self, name: &str) -> Result<bool, LibraryError> {
        Ok(self.filters.toggle(name, &self.categories)?)
    }

    pub fn activate_filter(&mut self, name: &str) -> Result<(), LibraryError> {
        Ok(self.filters.activate(name, &self.categories)?)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn set_filter_mode(&mut self, mode: FilterMode) {
        self.filters.set_mode(mode);
    }

    /// The feed list as currently filtered.
    pub fn visible(&self) -> FeedView<'_> {
        self.filters.apply(&self.feeds)
    }

    pub fn entities(&self) -> &EntityTable {
        &self.entities
    }

    pub fn dejunker(&self) -> Dejunker<'_> {
        Dejunker::new(&self.entities)
    }

    /// Merges a downloaded and parsed candidate into feed `id`.
    ///
    /// `last_modified` is only recorded when the merge succeeds, so a broken
    /// download is fetched in full next time.
    pub fn apply_download(
        &mut self,
        id: FeedId,
        candidate: Result<ParsedFeed, ParseError>,
        last_modified: Option<i64>,
    ) -> Result<MergeOutcome, LibraryError> {
        let feed = self.real_feed_mut(id)?;
        let outcome = merge(feed, candidate)?;
        if last_modified.is_some() {
            feed.last_modified = last_modified;
        }
        self.rebuild_smart_feed();
        Ok(outcome)
    }

    /// Flags a feed whose download failed before anything could be parsed.
    pub fn mark_problem(&mut self, id: FeedId) -> Result<(), LibraryError> {
        self.real_feed_mut(id)?.problem = true;
        Ok(())
    }

    /// Marks every item of feed `id` read. Through the smart feed this marks
    /// every unread item of every feed.
    pub fn mark_all_read(&mut self, id: FeedId) -> Result<(), LibraryError> {
        let idx = self.position(id)?;
        self.feeds[idx].mark_all_read();
        self.rebuild_smart_feed();
        Ok(())
    }

    pub fn smart_feed(&self) -> Option<&Feed> {
        self.feeds.iter().find(|f| f.is_smart())
    }

    /// Puts the smart feed at the head of the list, if it is not there yet.
    pub fn enable_smart_feed(&mut self) -> FeedId {
        if let Some(feed) = self.smart_feed() {
            return feed.id();
        }
        let id = self.allocate_id();
        self.feeds
            .insert(0, Feed::new_smart(id, SMART_FEED_URL, SMART_FEED_TITLE));
        self.rebuild_smart_feed();
        id
    }

    /// Refills the smart feed with the current unread items. The old handles
    /// are simply dropped; the items stay with their feeds.
    pub fn rebuild_smart_feed(&mut self) {
        if self.smart_feed().is_none() {
            return;
        }
        let unread = collect_unread(&self.feeds);
        if let Some(smart) = self.feeds.iter_mut().find(|f| f.is_smart()) {
            smart.set_items(unread);
        }
    }

    /// Orders feeds by title, case-insensitively, ignoring any of
    /// `ignore_prefixes` at the start of a title. The smart feed stays first.
    pub fn sort_feeds(&mut self, ignore_prefixes: &[String]) {
        let prefixes: Vec<String> = ignore_prefixes.iter().map(|p| p.to_lowercase()).collect();
        self.feeds
            .sort_by_cached_key(|feed| (!feed.is_smart(), sort_key(feed.title(), &prefixes)));
    }

    /// Number of unread items across all real feeds.
    pub fn unread_total(&self) -> usize {
        self.feeds
            .iter()
            .filter(|f| !f.is_smart())
            .map(Feed::unread_count)
            .sum()
    }

    /// Holds a handle to `item` for as long as the caller needs it, even
    /// across a reload of its feed.
    pub fn item(&self, id: FeedId, index: usize) -> Option<crate::feed::ItemRef> {
        self.feed(id)?.items().get(index).map(Rc::clone)
    }
}

fn sort_key(title: &str, prefixes: &[String]) -> String {
    let lower = title.to_lowercase();
    prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .find_map(|p| lower.strip_prefix(p.as_str()))
        .map(str::to_owned)
        .unwrap_or(lower)
}
