use std::io::Cursor;
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use thiserror::Error;

use crate::util::{atomic_write, validate_url};

/// SEC-003: Maximum allowed nesting depth for OPML outline elements.
/// Prevents stack overflow attacks from maliciously crafted deeply nested OPMLs.
const MAX_OPML_DEPTH: usize = 50;

#[derive(Debug, Error)]
pub enum OpmlError {
    /// SEC-003: OPML nesting depth exceeds safety limit.
    #[error("OPML nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
    #[error("XML parse error: {0}")]
    XmlParse(String),
    #[error("Failed to write OPML: {0}")]
    Write(String),
    #[error("OPML file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One subscription from an OPML file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpmlFeed {
    /// `title`, else `text`.
    pub title: Option<String>,
    pub xml_url: String,
    pub html_url: Option<String>,
    /// Names of the enclosing folder outlines, outermost first, then the
    /// entries of the outline's own `category` attribute.
    pub categories: Vec<String>,
}

/// Reads and parses an OPML file.
pub fn read_opml(path: &Path) -> Result<Vec<OpmlFeed>, OpmlError> {
    let content = std::fs::read_to_string(path)?;
    parse_opml(&content)
}

/// Extracts every `<outline>` carrying an `xmlUrl`, at any depth.
///
/// Outlines without `xmlUrl` are folders; their name becomes a category of
/// every feed nested inside them. Feeds whose URL fails validation are
/// skipped with a warning.
///
/// # Security
///
/// - SEC-002: `quick-xml` (0.37) never parses `<!ENTITY>` declarations. Only
///   the five XML built-ins are resolved by `decode_and_unescape_value()`, so
///   external entities cannot be expanded.
/// - URLs are validated to keep local and private addresses out.
pub fn parse_opml(content: &str) -> Result<Vec<OpmlFeed>, OpmlError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut feeds = Vec::new();
    let mut buf = Vec::new();
    // One entry per open <outline>; folders carry their name
    let mut open: Vec<Option<String>> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                if open.len() >= MAX_OPML_DEPTH {
                    return Err(OpmlError::MaxDepthExceeded(MAX_OPML_DEPTH));
                }
                let outline = read_outline(&e, &reader)?;
                let folder = match outline.xml_url {
                    Some(_) => None,
                    None => outline.title.clone(),
                };
                if let Some(feed) = outline.into_feed(&open) {
                    feeds.push(feed);
                }
                open.push(folder);
            }
            Ok(Event::Empty(e)) if e.name().as_ref() == b"outline" => {
                if let Some(feed) = read_outline(&e, &reader)?.into_feed(&open) {
                    feeds.push(feed);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"outline" => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(OpmlError::XmlParse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(feeds)
}

#[derive(Default)]
struct Outline {
    title: Option<String>,
    xml_url: Option<String>,
    html_url: Option<String>,
    category: Option<String>,
}

impl Outline {
    fn into_feed(self, open: &[Option<String>]) -> Option<OpmlFeed> {
        let url = self.xml_url?;
        if let Err(e) = validate_url(&url) {
            tracing::warn!(url = %url, error = %e, "Skipping invalid feed URL");
            return None;
        }

        let mut categories: Vec<String> = open.iter().flatten().cloned().collect();
        if let Some(attr) = self.category {
            categories.extend(split_category_attr(&attr));
        }

        Some(OpmlFeed {
            title: self.title,
            xml_url: url,
            html_url: self.html_url.filter(|u| validate_url(u).is_ok()),
            categories,
        })
    }
}

/// `category="/Tech/Rust,News"` names the last path segment of each entry.
fn split_category_attr(attr: &str) -> impl Iterator<Item = String> + '_ {
    attr.split(',')
        .filter_map(|entry| entry.trim().trim_end_matches('/').rsplit('/').next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
}

fn read_outline(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Result<Outline, OpmlError> {
    let mut outline = Outline::default();
    let mut text = None;
    let decoder = reader.decoder();

    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed OPML attribute");
                continue;
            }
        };
        let value = || {
            attr.decode_and_unescape_value(decoder)
                .map(|v| v.trim().to_owned())
                .map_err(|e| OpmlError::XmlParse(e.to_string()))
        };
        match attr.key.as_ref() {
            b"xmlUrl" => outline.xml_url = Some(value()?),
            b"htmlUrl" => outline.html_url = Some(value()?),
            b"title" => outline.title = Some(value()?),
            b"text" => text = Some(value()?),
            b"category" => outline.category = Some(value()?),
            _ => {}
        }
    }

    outline.title = outline.title.filter(|t| !t.is_empty()).or(text).filter(|t| !t.is_empty());
    Ok(outline)
}

/// Renders an OPML 2.0 document. Categories go in each outline's
/// `category` attribute, comma separated.
pub fn export_opml(feeds: &[OpmlFeed]) -> Result<String, OpmlError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    let w = &mut writer;

    emit(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let mut opml = BytesStart::new("opml");
    opml.push_attribute(("version", "2.0"));
    emit(w, Event::Start(opml))?;

    emit(w, Event::Start(BytesStart::new("head")))?;
    emit(w, Event::Start(BytesStart::new("title")))?;
    emit(w, Event::Text(BytesText::new("flurry subscriptions")))?;
    emit(w, Event::End(BytesEnd::new("title")))?;
    emit(w, Event::End(BytesEnd::new("head")))?;

    emit(w, Event::Start(BytesStart::new("body")))?;
    for feed in feeds {
        let title = feed.title.as_deref().unwrap_or(&feed.xml_url);
        let mut outline = BytesStart::new("outline");
        outline.push_attribute(("type", "rss"));
        outline.push_attribute(("text", title));
        outline.push_attribute(("title", title));
        outline.push_attribute(("xmlUrl", feed.xml_url.as_str()));
        if let Some(html_url) = &feed.html_url {
            outline.push_attribute(("htmlUrl", html_url.as_str()));
        }
        if !feed.categories.is_empty() {
            outline.push_attribute(("category", feed.categories.join(",").as_str()));
        }
        emit(w, Event::Empty(outline))?;
    }
    emit(w, Event::End(BytesEnd::new("body")))?;
    emit(w, Event::End(BytesEnd::new("opml")))?;

    let bytes = writer.into_inner().into_inner();
    String::from_utf8(bytes).map_err(|e| OpmlError::Write(e.to_string()))
}

fn emit(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), OpmlError> {
    writer
        .write_event(event)
        .map_err(|e| OpmlError::Write(e.to_string()))
}

/// Writes [`export_opml`] output to `path`, atomically.
pub fn export_to_file(feeds: &[OpmlFeed], path: &Path) -> Result<(), OpmlError> {
    let content = export_opml(feeds)?;
    atomic_write(path, content.as_bytes())?;
    Ok(())
}
