use std::collections::HashMap;
use std::rc::Rc;

use chrono::Utc;

use super::model::{Feed, Item, ItemRef};
use super::parser::{ParseError, ParsedFeed};

/// Counts from one successful merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub total: usize,
    /// Items whose fingerprint the feed had not seen before.
    pub new: usize,
}

/// Replaces `feed`'s items with a freshly parsed candidate, carrying read
/// flags across by fingerprint.
///
/// An item whose fingerprint matched one of the previous items keeps that
/// item's read flag; anything else starts unread. The new list is built
/// aside and swapped in with a single assignment, so an error never leaves
/// the feed half-updated. Title, link and description are replaced as a
/// whole; a user's custom title is left alone.
///
/// On a parse error the previous items stay and the feed is flagged as a
/// problem. Success clears the flag.
pub fn merge(
    feed: &mut Feed,
    candidate: Result<ParsedFeed, ParseError>,
) -> Result<MergeOutcome, ParseError> {
    let parsed = match candidate {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(feed = %feed.url, error = %e, "Keeping previous items");
            feed.problem = true;
            return Err(e);
        }
    };

    let previous: HashMap<&str, bool> = feed
        .items()
        .iter()
        .map(|item| (item.hash.as_str(), item.is_read()))
        .collect();

    let mut new = 0;
    let items: Vec<ItemRef> = parsed
        .items
        .into_iter()
        .map(|p| {
            let item = Item::from_parsed(feed.id(), p);
            let read = match previous.get(item.hash.as_str()) {
                Some(&read) => read,
                None => {
                    new += 1;
                    false
                }
            };
            Rc::new(item.with_read(read))
        })
        .collect();
    drop(previous);

    let outcome = MergeOutcome {
        total: items.len(),
        new,
    };

    feed.set_items(items);
    feed.original_title = parsed.title;
    feed.link = parsed.link;
    feed.description = parsed.description;
    feed.problem = false;
    feed.mtime = Some(Utc::now().timestamp());

    tracing::debug!(feed = %feed.url, total = outcome.total, new = outcome.new, "Merged");
    Ok(outcome)
}
