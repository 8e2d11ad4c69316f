//! End-to-end tests of the content pipeline without a network: raw feed
//! bytes go through the parser, the merge, the filter engine and the smart
//! feed, and come out as rendered text.

use flurry::content::{dejunk, wrap, EntityTable};
use flurry::feed::{parse_feed, FeedId};
use flurry::library::{FilterMode, Library};
use flurry::ui::{render_headlines, render_item, RenderOptions};
use pretty_assertions::assert_eq;

const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:uuid:feed</id>
  <updated>2023-11-14T22:13:20Z</updated>
  <entry>
    <title>First entry</title>
    <id>urn:uuid:1</id>
    <link href="https://example.com/1"/>
    <updated>2023-11-14T22:13:20Z</updated>
    <summary type="html">&lt;p&gt;Fish &amp;amp; chips&lt;br&gt;with &lt;b&gt;vinegar&lt;/b&gt;&lt;/p&gt;</summary>
  </entry>
  <entry>
    <title>Second entry</title>
    <id>urn:uuid:2</id>
    <updated>2023-11-13T22:13:20Z</updated>
  </entry>
</feed>"#;

fn opts(width: usize) -> RenderOptions {
    RenderOptions {
        width,
        color: false,
    }
}

fn library_with(urls: &[&str]) -> (Library, Vec<FeedId>) {
    let mut library = Library::default();
    let ids = urls.iter().map(|u| library.add_feed(u).unwrap()).collect();
    (library, ids)
}

#[test]
fn test_atom_to_rendered_item() {
    let (mut library, ids) = library_with(&["https://example.com/atom"]);
    let outcome = library
        .apply_download(ids[0], parse_feed(ATOM.as_bytes()), None)
        .unwrap();
    assert_eq!(outcome.total, 2);

    let feed = library.feed(ids[0]).unwrap();
    assert_eq!(feed.title(), "Atom Example");
    let first = &feed.items()[0];
    assert_eq!(first.link.as_deref(), Some("https://example.com/1"));

    let out = render_item(first, Some(feed), &library.dejunker(), &opts(40));
    assert_eq!(
        out,
        "Title: First entry\n\
         Feed: Atom Example\n\
         Link: https://example.com/1\n\
         Date: Tue, 14 Nov 2023 22:13 UTC\n\
         \n\
         Fish & chips\n\
         with vinegar\n"
    );

    // No summary at all gives the placeholder
    let second = render_item(&feed.items()[1], Some(feed), &library.dejunker(), &opts(40));
    assert!(second.ends_with("\nNo description available.\n"), "{second:?}");
}

#[test]
fn test_dejunk_then_wrap_is_stable() {
    let raw = "<div>The <em>quick</em> brown fox &amp; the lazy dog<br/>jump&#8230;</div>";
    let text = dejunk(Some(raw), &EntityTable::new());
    assert_eq!(text, "The quick brown fox & the lazy dog\njump\u{2026}");

    let wrapped = wrap(&text, 12);
    assert_eq!(wrapped, "The quick\nbrown fox &\nthe lazy dog\njump\u{2026}");
    assert_eq!(wrap(&wrapped, 12), wrapped);
}

#[test]
fn test_reparse_keeps_identity_and_read_state() {
    let (mut library, ids) = library_with(&["https://example.com/atom"]);
    library
        .apply_download(ids[0], parse_feed(ATOM.as_bytes()), None)
        .unwrap();
    library.feed(ids[0]).unwrap().items()[1].set_read(true);

    let outcome = library
        .apply_download(ids[0], parse_feed(ATOM.as_bytes()), None)
        .unwrap();
    assert_eq!(outcome.new, 0);
    let feed = library.feed(ids[0]).unwrap();
    assert!(!feed.items()[0].is_read());
    assert!(feed.items()[1].is_read());
}

#[test]
fn test_filters_and_or_and_round_trip() {
    let (mut library, ids) = library_with(&[
        "https://one.example/rss",
        "https://two.example/rss",
        "https://three.example/rss",
    ]);
    library.tag_feed(ids[0], "tech").unwrap();
    library.tag_feed(ids[1], "tech").unwrap();
    library.tag_feed(ids[1], "news").unwrap();
    library.tag_feed(ids[2], "news").unwrap();

    library.activate_filter("tech").unwrap();
    library.activate_filter("news").unwrap();

    library.set_filter_mode(FilterMode::And);
    let and: Vec<FeedId> = library.visible().iter().map(|f| f.id()).collect();
    assert_eq!(and, vec![ids[1]]);

    library.set_filter_mode(FilterMode::Or);
    let or: Vec<FeedId> = library.visible().iter().map(|f| f.id()).collect();
    assert_eq!(or, ids);

    library.clear_filters();
    let view = library.visible();
    assert!(view.is_canonical());
    assert!(std::ptr::eq(view.canonical(), library.feeds()));
}

#[test]
fn test_reading_through_smart_feed() {
    let (mut library, ids) = library_with(&["https://example.com/atom"]);
    let smart = library.enable_smart_feed();
    library
        .apply_download(ids[0], parse_feed(ATOM.as_bytes()), None)
        .unwrap();

    let headlines = render_headlines(&library, library.feed(smart).unwrap(), &opts(80), true);
    assert!(headlines.contains("[Atom Example] First entry"), "{headlines}");

    library.feed(smart).unwrap().items()[0].set_read(true);
    assert_eq!(library.feed(ids[0]).unwrap().unread_count(), 1);

    library.mark_all_read(smart).unwrap();
    assert_eq!(library.feed(ids[0]).unwrap().unread_count(), 0);
    assert!(library.feed(smart).unwrap().items().is_empty());
}

#[test]
fn test_sort_ignores_prefixes_and_keeps_smart_first() {
    let (mut library, ids) = library_with(&[
        "https://z.example/rss",
        "https://y.example/rss",
        "https://x.example/rss",
    ]);
    for (id, title) in ids.iter().zip(["The Zebra", "apple", "A Mango"]) {
        library.feed_mut(*id).unwrap().custom_title = Some(title.into());
    }
    library.enable_smart_feed();
    library.sort_feeds(&["the ".into(), "a ".into(), "an ".into()]);

    let titles: Vec<&str> = library.feeds().iter().map(|f| f.title()).collect();
    assert_eq!(titles, vec!["(New headlines)", "apple", "A Mango", "The Zebra"]);
}
