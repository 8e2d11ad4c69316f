use feed_rs::parser;
use thiserror::Error;

use crate::content::{sanitize_opt, CleanupMode};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Not a recognised feed: {0}")]
    Feed(#[from] parser::ParseFeedError),
}

/// Feed-level fields plus items, as extracted from one download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
    pub items: Vec<ParsedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedItem {
    pub title: Option<String>,
    pub link: Option<String>,
    /// Raw markup, dejunked only at display time.
    pub description: Option<String>,
    /// Only used for the fingerprint; never stored.
    pub guid: Option<String>,
    /// Unix seconds, from `published` or else `updated`.
    pub published: Option<i64>,
}

/// Parses RSS 0.9x, RSS 1.0 (RDF), RSS 2.0 or Atom.
///
/// Whitespace is cleaned up here, before anything else sees the text:
/// titles and links fold newlines, descriptions keep them.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed, ParseError> {
    let feed = parser::parse(bytes)?;

    let items = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry.links.first().map(|l| l.href.clone());
            let published = entry.published.or(entry.updated).map(|dt| dt.timestamp());
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));
            let guid = Some(entry.id).filter(|id| !id.trim().is_empty());

            let mut item = ParsedItem {
                title: entry.title.map(|t| t.content),
                link,
                description,
                guid,
                published,
            };
            sanitize_opt(&mut item.title, CleanupMode::Aggressive);
            sanitize_opt(&mut item.link, CleanupMode::Aggressive);
            sanitize_opt(&mut item.description, CleanupMode::Minimal);
            item
        })
        .collect();

    let mut parsed = ParsedFeed {
        title: feed.title.map(|t| t.content),
        link: feed.links.first().map(|l| l.href.clone()),
        description: feed.description.map(|d| d.content),
        items,
    };
    sanitize_opt(&mut parsed.title, CleanupMode::Aggressive);
    sanitize_opt(&mut parsed.link, CleanupMode::Aggressive);
    sanitize_opt(&mut parsed.description, CleanupMode::Minimal);

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Example News</title>
    <link>https://example.com/</link>
    <description>All the news</description>
    <item>
      <title>First	story</title>
      <link>https://example.com/1</link>
      <guid>urn:example:1</guid>
      <description>&lt;p&gt;Hello&lt;/p&gt;</description>
      <pubDate>Mon, 01 Jan 2024 12:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/2</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss() {
        let feed = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Example News"));
        assert_eq!(feed.link.as_deref(), Some("https://example.com/"));
        assert_eq!(feed.items.len(), 2);

        let first = &feed.items[0];
        assert_eq!(first.title.as_deref(), Some("First story"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/1"));
        assert_eq!(first.guid.as_deref(), Some("urn:example:1"));
        assert_eq!(first.description.as_deref(), Some("<p>Hello</p>"));
        assert_eq!(first.published, Some(1_704_110_400));
    }

    #[test]
    fn test_parse_atom() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <link href="https://atom.example/"/>
  <id>urn:feed</id>
  <updated>2024-02-01T00:00:00Z</updated>
  <entry>
    <title>Entry</title>
    <link href="https://atom.example/e"/>
    <id>urn:entry:1</id>
    <updated>2024-02-01T00:00:00Z</updated>
    <content type="html">&lt;b&gt;Body&lt;/b&gt;</content>
  </entry>
</feed>"#;
        let feed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("Atom Example"));
        let entry = &feed.items[0];
        assert_eq!(entry.guid.as_deref(), Some("urn:entry:1"));
        assert_eq!(entry.description.as_deref(), Some("<b>Body</b>"));
        assert_eq!(entry.published, Some(1_706_745_600));
    }

    #[test]
    fn test_parse_rdf() {
        let rdf = r#"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://rdf.example/">
    <title>RDF Example</title>
    <link>https://rdf.example/</link>
    <description>rdf</description>
  </channel>
  <item rdf:about="https://rdf.example/1">
    <title>One</title>
    <link>https://rdf.example/1</link>
  </item>
</rdf:RDF>"#;
        let feed = parse_feed(rdf.as_bytes()).unwrap();
        assert_eq!(feed.title.as_deref(), Some("RDF Example"));
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title.as_deref(), Some("One"));
    }

    #[test]
    fn test_garbage_is_error() {
        assert!(parse_feed(b"this is not xml").is_err());
        assert!(parse_feed(b"<html><body>nope</body></html>").is_err());
    }

    #[test]
    fn test_same_input_same_items() {
        let a = parse_feed(RSS.as_bytes()).unwrap();
        let b = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(a, b);
    }
}
