use thiserror::Error;

use super::categories::{same_name, CategoryRegistry};
use crate::feed::Feed;

/// Most categories that can be filtered on at once.
pub const MAX_FILTERS: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("At most {} category filters can be active", MAX_FILTERS)]
    TooMany,
    #[error("No such category: {0}")]
    UnknownCategory(String),
}

/// How active filters combine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterMode {
    /// A feed must carry every active category.
    And,
    /// A feed must carry at least one active category.
    #[default]
    Or,
}

/// The active category filters.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    names: Vec<String>,
    mode: FilterMode,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `name`. Already-active names are accepted silently.
    pub fn activate(&mut self, name: &str, registry: &CategoryRegistry) -> Result<(), FilterError> {
        let Some(category) = registry.get(name) else {
            return Err(FilterError::UnknownCategory(name.to_owned()));
        };
        if self.is_active(name) {
            return Ok(());
        }
        if self.names.len() >= MAX_FILTERS {
            return Err(FilterError::TooMany);
        }
        self.names.push(category.name.clone());
        Ok(())
    }

    /// Removes `name`. Returns whether it was active.
    pub fn deactivate(&mut self, name: &str) -> bool {
        let before = self.names.len();
        self.names.retain(|n| !same_name(n, name));
        self.names.len() != before
    }

    /// Flips `name` on or off. Returns whether it is now active.
    pub fn toggle(&mut self, name: &str, registry: &CategoryRegistry) -> Result<bool, FilterError> {
        if self.deactivate(name) {
            Ok(false)
        } else {
            self.activate(name, registry).map(|()| true)
        }
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: FilterMode) {
        self.mode = mode;
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.names.iter().any(|n| same_name(n, name))
    }

    pub fn active(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Whether `feed` passes the filters. Everything passes an empty set;
    /// a feed with no categories passes no non-empty set.
    pub fn matches(&self, feed: &Feed) -> bool {
        if self.names.is_empty() {
            return true;
        }
        match self.mode {
            FilterMode::And => self.names.iter().all(|n| feed.has_category(n)),
            FilterMode::Or => self.names.iter().any(|n| feed.has_category(n)),
        }
    }

    /// The feeds that pass, as a view over `feeds`.
    ///
    /// Filters always apply to the canonical list handed in here, never to
    /// an earlier result, and nothing is copied.
    pub fn apply<'a>(&self, feeds: &'a [Feed]) -> FeedView<'a> {
        let selection = (!self.names.is_empty()).then(|| {
            feeds
                .iter()
                .enumerate()
                .filter(|(_, feed)| self.matches(feed))
                .map(|(idx, _)| idx)
                .collect()
        });
        FeedView { feeds, selection }
    }
}

/// A filtered window onto the canonical feed list.
///
/// With no filter active the view is the canonical slice itself.
#[derive(Debug, Clone)]
pub struct FeedView<'a> {
    feeds: &'a [Feed],
    selection: Option<Vec<usize>>,
}

impl<'a> FeedView<'a> {
    /// Whether this view is the unfiltered canonical list.
    pub fn is_canonical(&self) -> bool {
        self.selection.is_none()
    }

    /// The canonical list the view was taken over.
    pub fn canonical(&self) -> &'a [Feed] {
        self.feeds
    }

    pub fn len(&self) -> usize {
        self.selection.as_ref().map_or(self.feeds.len(), Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The `pos`th visible feed.
    pub fn get(&self, pos: usize) -> Option<&'a Feed> {
        match &self.selection {
            None => self.feeds.get(pos),
            Some(indices) => indices.get(pos).map(|&idx| &self.feeds[idx]),
        }
    }

    /// Positions of the visible feeds in the canonical list.
    pub fn indices(&self) -> Box<dyn Iterator<Item = usize> + '_> {
        match &self.selection {
            None => Box::new(0..self.feeds.len()),
            Some(indices) => Box::new(indices.iter().copied()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Feed> + '_ {
        let feeds = self.feeds;
        self.indices().map(move |idx| &feeds[idx])
    }
}
