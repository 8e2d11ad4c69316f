use chrono::DateTime;

use super::RenderOptions;
use crate::content::{wrap, Dejunker};
use crate::feed::{Feed, Item};
use crate::util::strip_control_chars;

fn format_date(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.format("%a, %d %b %Y %H:%M UTC").to_string())
}

/// A single item: header lines, a blank line, then the dejunked description
/// wrapped to `opts.width`.
///
/// The link is never wrapped or cut so it can be copied whole.
pub fn render_item(
    item: &Item,
    owner: Option<&Feed>,
    dejunker: &Dejunker<'_>,
    opts: &RenderOptions,
) -> String {
    let mut out = String::new();

    let title = format!("Title: {}", strip_control_chars(item.display_title()));
    out.push_str(&wrap(&title, opts.width));
    out.push('\n');
    if let Some(feed) = owner {
        out.push_str(&wrap(&format!("Feed: {}", strip_control_chars(feed.title())), opts.width));
        out.push('\n');
    }
    if let Some(link) = item.link.as_deref().filter(|l| !l.is_empty()) {
        out.push_str(&format!("Link: {}\n", strip_control_chars(link)));
    }
    if let Some(date) = item.published.and_then(format_date) {
        out.push_str(&format!("Date: {date}\n"));
    }
    out.push('\n');

    let body = dejunker.dejunk(item.description.as_deref());
    out.push_str(wrap(&body, opts.width).trim_end_matches('\n'));
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{EntityTable, NO_DESCRIPTION};
    use crate::feed::FeedId;
    use pretty_assertions::assert_eq;

    fn opts(width: usize) -> RenderOptions {
        RenderOptions {
            width,
            color: false,
        }
    }

    #[test]
    fn test_render_full_item() {
        let mut feed = Feed::new(FeedId(1), "https://e.com/rss");
        feed.original_title = Some("Example".into());
        let item = Item::new(FeedId(1), "h".into())
            .with_title("Hello")
            .with_link("https://e.com/1")
            .with_published(1_700_000_000)
            .with_description("<p>The quick brown fox</p><p>jumps &amp; runs</p>");
        let entities = EntityTable::new();

        let out = render_item(&item, Some(&feed), &Dejunker::new(&entities), &opts(14));
        assert_eq!(
            out,
            "Title: Hello\n\
             Feed: Example\n\
             Link: https://e.com/1\n\
             Date: Tue, 14 Nov 2023 22:13 UTC\n\
             \n\
             The quick\n\
             brown fox\n\
             \n\
             jumps & runs\n"
        );
    }

    #[test]
    fn test_missing_description_placeholder() {
        let item = Item::new(FeedId(1), "h".into());
        let entities = EntityTable::new();
        let out = render_item(&item, None, &Dejunker::new(&entities), &opts(80));
        assert_eq!(out, format!("Title: (untitled)\n\n{NO_DESCRIPTION}\n"));
    }

    #[test]
    fn test_user_entities_applied() {
        let item = Item::new(FeedId(1), "h".into()).with_description("a&shy;b");
        let mut entities = EntityTable::new();
        entities.insert("shy", "");
        let out = render_item(&item, None, &Dejunker::new(&entities), &opts(80));
        assert!(out.ends_with("\nab\n"), "{out:?}");
    }
}
