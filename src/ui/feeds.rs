use super::{paint_category, RenderOptions};
use crate::feed::Feed;
use crate::library::{FilterMode, Library};
use crate::util::{strip_control_chars, truncate_to_width};

/// Marker column: `!` for a feed whose last update failed, `N` for one with
/// unread items.
fn status_marker(feed: &Feed) -> char {
    if feed.problem {
        '!'
    } else if feed.unread_count() > 0 {
        'N'
    } else {
        ' '
    }
}

/// The feed list as currently filtered.
///
/// Numbers are positions in the full list, so a feed keeps its number while
/// filters come and go and can be passed straight back to `show` or `read`.
pub fn render_feed_list(library: &Library, opts: &RenderOptions) -> String {
    let view = library.visible();
    let filters = library.filters();
    let mut out = String::new();

    if !filters.is_empty() {
        let mode = match filters.mode() {
            FilterMode::And => "all of",
            FilterMode::Or => "any of",
        };
        out.push_str(&format!("Showing feeds in {}: {}\n", mode, filters.active().join(", ")));
    }

    if view.is_empty() {
        out.push_str(if filters.is_empty() {
            "No feeds\n"
        } else {
            "No feeds match the active filters\n"
        });
        return out;
    }

    let number_width = library.feeds().len().to_string().len();
    for (idx, feed) in view.indices().zip(view.iter()) {
        let title = strip_control_chars(feed.title());
        let mut line = format!(
            "{:>w$} {} {} ({}/{})",
            idx + 1,
            status_marker(feed),
            title,
            feed.unread_count(),
            feed.items().len(),
            w = number_width,
        );
        let tagged = !feed.categories().is_empty();
        if tagged {
            line.push_str("  ");
            line.push_str(&feed.categories().join(", "));
        }

        let mut line = truncate_to_width(&line, opts.width).into_owned();
        if opts.color && tagged {
            let start = line.rfind("  ").map_or(line.len(), |i| i + 2);
            let painted: Vec<String> = line[start..]
                .split(", ")
                .map(|name| paint_category(name, library.categories(), true))
                .collect();
            line.replace_range(start.., &painted.join(", "));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
