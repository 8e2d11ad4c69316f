use chrono::{DateTime, Utc};

use super::RenderOptions;
use crate::feed::Feed;
use crate::library::Library;
use crate::util::{display_width, strip_control_chars, truncate_to_width};

/// Format a timestamp relative to `now`: minutes, hours and days up to a
/// week, then the date.
pub fn format_relative_time(timestamp: Option<i64>, now: i64) -> String {
    let Some(ts) = timestamp else {
        return String::new();
    };

    let diff = now.saturating_sub(ts);

    // Future dates (malformed feeds)
    if diff < 0 {
        return "now".to_string();
    }
    if diff < 3600 {
        return format!("{}m", diff / 60);
    }
    if diff < 86400 {
        return format!("{}h", diff / 3600);
    }
    if diff < 604800 {
        return format!("{}d", diff / 86400);
    }

    DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%b %d").to_string())
        .unwrap_or_default()
}

/// Headlines of `feed`, numbered from 1 in feed order.
///
/// With `unread_only` read items are skipped but the remaining ones keep
/// their numbers. Items shown through the smart feed are prefixed with the
/// title of the feed they belong to.
pub fn render_headlines(
    library: &Library,
    feed: &Feed,
    opts: &RenderOptions,
    unread_only: bool,
) -> String {
    let now = Utc::now().timestamp();
    let items = feed.items();

    let mut out = format!(
        "{} ({} unread, {} total)\n",
        strip_control_chars(feed.title()),
        feed.unread_count(),
        items.len()
    );
    if items.is_empty() {
        out.push_str("No items\n");
        return out;
    }

    let number_width = items.len().to_string().len();
    for (idx, item) in items.iter().enumerate() {
        if unread_only && item.is_read() {
            continue;
        }

        let prefix = format!(
            "{:>w$} {} ",
            idx + 1,
            if item.is_read() { ' ' } else { 'N' },
            w = number_width
        );
        let time = format_relative_time(item.published, now);
        let suffix = if time.is_empty() {
            String::new()
        } else {
            format!("  {time}")
        };

        let mut title = String::new();
        if feed.is_smart() {
            if let Some(owner) = library.feed(item.feed) {
                title.push_str(&format!("[{}] ", strip_control_chars(owner.title())));
            }
        }
        title.push_str(&strip_control_chars(item.display_title()));

        let room = opts
            .width
            .saturating_sub(display_width(&prefix) + display_width(&suffix));
        out.push_str(&prefix);
        out.push_str(&truncate_to_width(&title, room));
        out.push_str(&suffix);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ParsedFeed, ParsedItem};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_relative_time() {
        let now = 1_700_000_000;
        assert_eq!(format_relative_time(None, now), "");
        assert_eq!(format_relative_time(Some(now + 10), now), "now");
        assert_eq!(format_relative_time(Some(now - 300), now), "5m");
        assert_eq!(format_relative_time(Some(now - 7200), now), "2h");
        assert_eq!(format_relative_time(Some(now - 3 * 86400), now), "3d");
        // 2023-10-15, more than a week back
        assert_eq!(format_relative_time(Some(now - 30 * 86400), now), "Oct 15");
    }

    // Timestamps come from cache files and may be anything
    #[test]
    fn test_relative_time_extreme_timestamps() {
        let now = 1_700_000_000;
        assert_eq!(format_relative_time(Some(i64::MIN), now), "");
        assert_eq!(format_relative_time(Some(i64::MAX), now), "now");
    }

    fn library() -> Library {
        let mut library = Library::default();
        let id = library.add_feed("https://a.example/rss").unwrap();
        let parsed = ParsedFeed {
            title: Some("Alpha".into()),
            items: ["first", "second", "third"]
                .iter()
                .map(|t| ParsedItem {
                    title: Some((*t).into()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };
        library.apply_download(id, Ok(parsed), None).unwrap();
        library.feeds()[0].items()[1].set_read(true);
        library
    }

    #[test]
    fn test_headlines_mark_unread() {
        let library = library();
        let out = render_headlines(&library, &library.feeds()[0], &RenderOptions::default(), false);
        assert_eq!(
            out,
            "Alpha (2 unread, 3 total)\n1 N first\n2   second\n3 N third\n"
        );
    }

    #[test]
    fn test_unread_only_keeps_numbers() {
        let library = library();
        let out = render_headlines(&library, &library.feeds()[0], &RenderOptions::default(), true);
        assert_eq!(out, "Alpha (2 unread, 3 total)\n1 N first\n3 N third\n");
    }

    #[test]
    fn test_smart_feed_names_owner() {
        let mut library = library();
        library.enable_smart_feed();
        let smart = library.smart_feed().unwrap();
        let out = render_headlines(&library, smart, &RenderOptions::default(), false);
        assert_eq!(
            out,
            "(New headlines) (2 unread, 2 total)\n1 N [Alpha] first\n2 N [Alpha] third\n"
        );
    }

    #[test]
    fn test_long_titles_truncated() {
        let library = library();
        let opts = RenderOptions {
            width: 8,
            color: false,
        };
        let out = render_headlines(&library, &library.feeds()[0], &opts, false);
        let lines: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(lines, vec!["1 N f...", "2   s...", "3 N t..."]);
    }
}
