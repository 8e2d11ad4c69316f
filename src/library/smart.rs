use std::rc::Rc;

use crate::feed::{Feed, ItemRef};

/// Display title of the smart feed.
pub const SMART_FEED_TITLE: &str = "(New headlines)";

/// Pseudo-URL identifying the smart feed; never fetched or cached.
pub const SMART_FEED_URL: &str = "smartfeed:/newitems";

/// Every unread item across `feeds`, in feed order then item order.
///
/// The result holds handles to the owning feeds' items, so marking one read
/// here marks it read everywhere. Smart feeds themselves are skipped.
pub fn collect_unread(feeds: &[Feed]) -> Vec<ItemRef> {
    feeds
        .iter()
        .filter(|feed| !feed.is_smart())
        .flat_map(|feed| feed.items())
        .filter(|item| !item.is_read())
        .map(Rc::clone)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FeedId, Item};

    fn feed_with(id: u32, read: &[bool]) -> Feed {
        let mut feed = Feed::new(FeedId(id), format!("https://f{id}.example"));
        feed.set_items(
            read.iter()
                .enumerate()
                .map(|(n, &r)| Rc::new(Item::new(FeedId(id), format!("{id}-{n}")).with_read(r)))
                .collect(),
        );
        feed
    }

    #[test]
    fn test_feed_then_item_order() {
        let feeds = vec![feed_with(1, &[false, true, false]), feed_with(2, &[false])];
        let hashes: Vec<_> = collect_unread(&feeds).iter().map(|i| i.hash.clone()).collect();
        assert_eq!(hashes, vec!["1-0", "1-2", "2-0"]);
    }

    #[test]
    fn test_marking_read_through_smart_view() {
        let feeds = vec![feed_with(1, &[false, false])];
        let unread = collect_unread(&feeds);
        unread[1].set_read(true);

        assert!(feeds[0].items()[1].is_read());
        assert!(Rc::ptr_eq(&unread[0], &feeds[0].items()[0]));
        assert_eq!(feeds[0].unread_count(), 1);
    }

    #[test]
    fn test_smart_feeds_skipped() {
        let mut smart = Feed::new_smart(FeedId(9), SMART_FEED_URL, SMART_FEED_TITLE);
        smart.set_items(vec![Rc::new(Item::new(FeedId(1), "dup".into()))]);
        let feeds = vec![smart, feed_with(1, &[false])];
        assert_eq!(collect_unread(&feeds).len(), 1);
    }

    #[test]
    fn test_nothing_unread() {
        assert!(collect_unread(&[feed_with(1, &[true])]).is_empty());
        assert!(collect_unread(&[]).is_empty());
    }
}
