//! Application state and the operations behind each command.
//!
//! [`App`] ties the library to its files: it loads the config, subscriptions
//! and per-feed caches on start, runs updates, and writes everything back.
use std::path::Path;

use anyhow::{bail, Context, Result};
use thiserror::Error;

use crate::config::{Config, Paths};
use crate::feed::{
    export_to_file, parse_feed, read_opml, run_filter, Feed, FeedId, FetchError, FetchOutcome,
    Fetcher, FilterCommandError, ItemRef, MergeOutcome, OpmlFeed,
};
use crate::library::{Library, LibraryError};
use crate::storage::{CacheStore, SubscriptionList};
use crate::ui::RenderOptions;

// ============================================================================
// Update Results
// ============================================================================

/// Why one feed could not be updated.
#[derive(Debug, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Filter(#[from] FilterCommandError),
    #[error(transparent)]
    Library(#[from] LibraryError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The server answered 304; items are unchanged.
    NotModified,
    Updated(MergeOutcome),
}

/// Outcome of updating one feed.
#[derive(Debug)]
pub struct UpdateResult {
    pub feed: FeedId,
    pub url: String,
    pub result: Result<UpdateStatus, UpdateError>,
}

/// What an OPML import did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub skipped: usize,
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    pub library: Library,
    paths: Paths,
    cache: CacheStore,
}

impl App {
    /// Loads config, subscriptions and caches from `paths`.
    pub fn load(paths: Paths) -> Result<Self> {
        let config = Config::load(&paths.config_file).with_context(|| {
            format!("Failed to load config from {}", paths.config_file.display())
        })?;
        Self::with_config(paths, config)
    }

    pub fn with_config(paths: Paths, config: Config) -> Result<Self> {
        let mut library = Library::new(config.entity_table());
        // Colours first, so categories created below pick them up
        for (name, color) in &config.category_colors {
            library.set_category_color(name, color.as_str());
        }

        let subscriptions = SubscriptionList::load(&paths.subscriptions)
            .context("Failed to load subscriptions")?;
        subscriptions.populate(&mut library);

        let cache = CacheStore::new(&paths.cache_dir);
        let ids: Vec<FeedId> = library.feeds().iter().map(Feed::id).collect();
        for id in ids {
            let Some(feed) = library.feed_mut(id) else {
                continue;
            };
            // A broken cache costs the feed its items, never the start-up
            if let Err(e) = cache.restore(feed) {
                tracing::warn!(feed = %feed.url, error = %e, "Ignoring unreadable cache");
            }
        }

        if config.smart_feed {
            library.enable_smart_feed();
        }
        library.sort_feeds(&config.sort_ignore_prefixes);

        tracing::debug!(
            feeds = library.feeds().len(),
            categories = library.categories().len(),
            "Library loaded"
        );

        Ok(Self {
            config,
            library,
            paths,
            cache,
        })
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    /// Layout for rendered output. `width` overrides the configured width.
    pub fn render_options(&self, width: Option<usize>, color: bool) -> RenderOptions {
        RenderOptions {
            color,
            ..RenderOptions::with_width(width.unwrap_or(self.config.wrap_width))
        }
    }

    /// Finds a feed by its 1-based position in the sorted list, or by URL.
    pub fn resolve_feed(&self, feed: &str) -> Result<FeedId> {
        let query = feed.trim();
        if let Ok(n) = query.parse::<usize>() {
            return match n.checked_sub(1).and_then(|i| self.library.feeds().get(i)) {
                Some(feed) => Ok(feed.id()),
                None => bail!(
                    "No feed number {} (there are {})",
                    n,
                    self.library.feeds().len()
                ),
            };
        }
        match self.library.find_by_url(query) {
            Some(feed) => Ok(feed.id()),
            None => bail!("Not subscribed to {query}"),
        }
    }

    /// Item `number` (1-based) of feed `id`.
    pub fn resolve_item(&self, id: FeedId, number: usize) -> Result<ItemRef> {
        number
            .checked_sub(1)
            .and_then(|idx| self.library.item(id, idx))
            .with_context(|| format!("No item number {number} in feed {id}"))
    }

    // ------------------------------------------------------------------------
    // Updating
    // ------------------------------------------------------------------------

    /// Downloads and merges one feed.
    ///
    /// Any failure before the merge flags the feed as a problem and leaves
    /// its items alone; a parse failure does the same inside the merge.
    pub async fn update_feed(
        &mut self,
        fetcher: &Fetcher,
        id: FeedId,
    ) -> Result<UpdateStatus, UpdateError> {
        let feed = self.library.feed(id).ok_or(LibraryError::UnknownFeed(id))?;
        if feed.is_smart() {
            return Err(LibraryError::SmartFeed.into());
        }
        let url = feed.url.clone();
        let filter = feed.filter.clone();
        let since = feed.last_modified;

        let (body, last_modified) = match fetcher.fetch(&url, since).await {
            Ok(FetchOutcome::NotModified) => {
                if let Some(feed) = self.library.feed_mut(id) {
                    feed.problem = false;
                }
                return Ok(UpdateStatus::NotModified);
            }
            Ok(FetchOutcome::Fetched {
                body,
                last_modified,
            }) => (body, last_modified),
            Err(e) => return Err(self.fail(id, e)),
        };

        let body = match filter {
            Some(command) => match run_filter(&command, &body).await {
                Ok(filtered) => filtered,
                Err(e) => return Err(self.fail(id, e)),
            },
            None => body,
        };

        let outcome = self
            .library
            .apply_download(id, parse_feed(&body), last_modified)?;
        tracing::info!(feed = %url, new = outcome.new, total = outcome.total, "Updated");
        Ok(UpdateStatus::Updated(outcome))
    }

    fn fail(&mut self, id: FeedId, error: impl Into<UpdateError>) -> UpdateError {
        let error = error.into();
        if let Err(e) = self.library.mark_problem(id) {
            tracing::warn!(id = %id, error = %e, "Failed to flag feed");
        }
        error
    }

    /// Updates every feed (or just `only`), one after another, writing each
    /// feed's cache as soon as it has been merged.
    pub async fn update(&mut self, fetcher: &Fetcher, only: Option<FeedId>) -> Vec<UpdateResult> {
        let targets: Vec<(FeedId, String)> = self
            .library
            .feeds()
            .iter()
            .filter(|f| !f.is_smart() && only.map_or(true, |id| id == f.id()))
            .map(|f| (f.id(), f.url.clone()))
            .collect();

        let total = targets.len();
        let mut results = Vec::with_capacity(total);
        for (done, (id, url)) in targets.into_iter().enumerate() {
            let result = self.update_feed(fetcher, id).await;
            match &result {
                Ok(UpdateStatus::Updated(_)) => self.save_cache(id),
                Ok(UpdateStatus::NotModified) => {}
                Err(e) => tracing::warn!(feed = %url, error = %e, "Update failed"),
            }
            tracing::debug!(done = done + 1, total, "Update progress");
            results.push(UpdateResult {
                feed: id,
                url,
                result,
            });
        }

        // Downloads may have brought new titles
        self.library.sort_feeds(&self.config.sort_ignore_prefixes);
        results
    }

    // ------------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------------

    pub fn subscribe(
        &mut self,
        url: &str,
        title: Option<String>,
        categories: &[String],
        filter: Option<String>,
        allow_local: bool,
    ) -> Result<FeedId> {
        let id = if allow_local {
            self.library.add_local_feed(url)?
        } else {
            self.library.add_feed(url)?
        };
        if let Some(feed) = self.library.feed_mut(id) {
            feed.custom_title = title;
            feed.filter = filter;
        }
        for name in categories {
            self.library.tag_feed(id, name)?;
        }
        self.library.sort_feeds(&self.config.sort_ignore_prefixes);
        Ok(id)
    }

    /// Removes a feed and its cache file.
    pub fn unsubscribe(&mut self, id: FeedId) -> Result<Feed> {
        let feed = self.library.remove_feed(id)?;
        if let Err(e) = self.cache.remove(&feed.url) {
            tracing::warn!(feed = %feed.url, error = %e, "Failed to remove cache");
        }
        Ok(feed)
    }

    /// Marks item `number` (1-based) of a feed read, or the whole feed when
    /// no number is given. Returns how many items changed.
    pub fn mark_read(&mut self, id: FeedId, number: Option<usize>) -> Result<usize> {
        let changed = match number {
            Some(n) => {
                let item = self.resolve_item(id, n)?;
                let was_unread = !item.is_read();
                item.set_read(true);
                self.library.rebuild_smart_feed();
                usize::from(was_unread)
            }
            None => {
                let unread = self
                    .library
                    .feed(id)
                    .map(Feed::unread_count)
                    .unwrap_or_default();
                self.library.mark_all_read(id)?;
                unread
            }
        };
        Ok(changed)
    }

    // ------------------------------------------------------------------------
    // OPML
    // ------------------------------------------------------------------------

    /// Subscribes to every feed in an OPML file. Folder outlines become
    /// categories; feeds already subscribed or with bad URLs are skipped.
    pub fn import_opml(&mut self, path: &Path) -> Result<ImportSummary> {
        let entries = read_opml(path)
            .with_context(|| format!("Failed to read OPML file {}", path.display()))?;

        let mut summary = ImportSummary::default();
        for entry in entries {
            let id = match self.library.add_feed(&entry.xml_url) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(feed = %entry.xml_url, error = %e, "Skipping OPML entry");
                    summary.skipped += 1;
                    continue;
                }
            };
            if let Some(feed) = self.library.feed_mut(id) {
                // Shown until the first update brings the feed's own title
                feed.original_title = entry.title;
                feed.link = entry.html_url;
            }
            for name in &entry.categories {
                if let Err(e) = self.library.tag_feed(id, name) {
                    tracing::warn!(feed = %entry.xml_url, category = %name, error = %e, "Skipping category");
                }
            }
            summary.added += 1;
        }

        self.library.sort_feeds(&self.config.sort_ignore_prefixes);
        tracing::info!(added = summary.added, skipped = summary.skipped, "OPML imported");
        Ok(summary)
    }

    /// Writes every subscription to an OPML file. Returns the feed count.
    pub fn export_opml(&self, path: &Path) -> Result<usize> {
        let feeds: Vec<OpmlFeed> = self
            .library
            .feeds()
            .iter()
            .filter(|f| !f.is_smart())
            .map(|f| OpmlFeed {
                title: Some(f.title().to_owned()),
                xml_url: f.url.clone(),
                html_url: f.link.clone(),
                categories: f.categories().to_vec(),
            })
            .collect();
        export_to_file(&feeds, path)
            .with_context(|| format!("Failed to write OPML file {}", path.display()))?;
        Ok(feeds.len())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    fn save_cache(&self, id: FeedId) {
        let Some(feed) = self.library.feed(id) else {
            return;
        };
        if let Err(e) = self.cache.save(feed) {
            tracing::warn!(feed = %feed.url, error = %e, "Failed to write cache");
        }
    }

    /// Writes the subscription list and every feed's cache.
    pub fn save(&self) -> Result<()> {
        SubscriptionList::from_library(&self.library)
            .save(&self.paths.subscriptions)
            .context("Failed to save subscriptions")?;
        for feed in self.library.feeds() {
            self.save_cache(feed.id());
        }
        Ok(())
    }
}
