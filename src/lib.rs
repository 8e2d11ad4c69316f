//! flurry: a terminal feed reader.
//!
//! The crate is split along the path a feed takes from the network to the
//! screen:
//!
//! - [`feed`] - parsing, item identity, merging a fresh download into the
//!   feed already held in memory, fetching and OPML
//! - [`content`] - turning raw descriptions into displayable, wrapped text
//! - [`library`] - the canonical feed list with categories, filters and the
//!   smart "new items" feed
//! - [`storage`] - the per-feed cache and the subscription list on disk
//! - [`ui`] - plain-text rendering of lists and items
//!
//! Everything in `content`, `feed::merge`, `feed::hash` and `library` is
//! synchronous; only the fetcher and filter commands await.

pub mod app;
pub mod config;
pub mod content;
pub mod feed;
pub mod library;
pub mod storage;
pub mod ui;
pub mod util;
