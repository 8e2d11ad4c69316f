//! Feeds: the item model, how items are identified and merged across
//! reloads, and the collaborators that produce candidate items.
//!
//! - [`model`] - `Feed`, `Item` and the shared [`ItemRef`] handle
//! - [`hash`] - content fingerprints used as item identity
//! - [`merge`] - swaps in a reparsed item list, carrying read flags over
//! - [`parser`] - RSS/RDF/Atom parsing using the `feed-rs` crate
//! - [`fetcher`] - conditional HTTP download
//! - [`filter_cmd`] - per-feed shell filters applied to the download
//! - [`opml`] - subscription import and export
//!
//! # Example
//!
//! ```
//! use flurry::feed::{merge, parse_feed, Feed, FeedId};
//!
//! let xml = br#"<rss version="2.0"><channel><title>T</title>
//!   <item><title>Hello</title><guid>1</guid></item>
//! </channel></rss>"#;
//!
//! let mut feed = Feed::new(FeedId(1), "https://example.com/rss");
//! let outcome = merge(&mut feed, parse_feed(xml)).unwrap();
//! assert_eq!(outcome.new, 1);
//! assert_eq!(feed.title(), "T");
//! ```

pub mod fetcher;
pub mod filter_cmd;
pub mod hash;
pub mod merge;
pub mod model;
pub mod opml;
pub mod parser;

pub use fetcher::{FetchError, FetchOutcome, Fetcher};
pub use filter_cmd::{run_filter, FilterCommandError};
pub use hash::{fingerprint, item_fingerprint, FINGERPRINT_LEN};
pub use merge::{merge, MergeOutcome};
pub use model::{Feed, FeedId, Item, ItemRef};
pub use opml::{export_opml, export_to_file, parse_opml, read_opml, OpmlError, OpmlFeed};
pub use parser::{parse_feed, ParseError, ParsedFeed, ParsedItem};
