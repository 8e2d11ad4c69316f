use std::borrow::Cow;

use super::entities::{self, EntityTable};
use super::sanitize::{sanitize, CleanupMode};
use crate::util::strip_control_chars;

/// Shown in place of a missing or unusable description.
pub const NO_DESCRIPTION: &str = "No description available.";

/// Emitted in place of an `<img>` tag.
pub const IMAGE_MARKER: &str = "[img] ";

/// Longest entity name considered; anything longer is a literal `&`.
const MAX_ENTITY_LEN: usize = 32;

/// Strips tag soup and decodes entities in feed text for display.
///
/// Holds only a borrow of the user's entity table, so one is cheap to build
/// per render.
///
/// # Pipeline
///
/// 1. Entity-escaped markup (`&lt;p&gt;`) is unescaped, so double-escaped
///    feeds are stripped like plain HTML.
/// 2. Tags before the first text are skipped. An unterminated leading tag
///    leaves nothing usable and yields [`NO_DESCRIPTION`].
/// 3. Remaining tags are dropped. `p` and `br` become a newline unless one
///    already follows; `img` becomes [`IMAGE_MARKER`].
/// 4. Whitespace cleanup ([`CleanupMode::Minimal`]).
/// 5. Entities: XML built-ins, the user table, numeric references, known
///    HTML names. Unknown references come out as `&name`, without the `;`.
/// 6. Terminal control sequences are removed.
///
/// Never fails; the result is always a fresh `String`.
#[derive(Debug, Clone, Copy)]
pub struct Dejunker<'a> {
    entities: &'a EntityTable,
}

#[derive(Debug, PartialEq, Eq)]
enum TagKind {
    Break,
    Image,
    Other,
}

impl<'a> Dejunker<'a> {
    pub fn new(entities: &'a EntityTable) -> Self {
        Self { entities }
    }

    pub fn dejunk(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw else {
            return NO_DESCRIPTION.to_owned();
        };

        let unescaped = unescape_markup(raw);
        let Some(body) = skip_leading_tags(&unescaped) else {
            return NO_DESCRIPTION.to_owned();
        };

        let mut text = strip_tags(body);
        sanitize(&mut text, CleanupMode::Minimal);
        if text.contains('&') {
            text = self.decode_entities(&text);
        }

        match strip_control_chars(&text) {
            Cow::Borrowed(_) => text,
            Cow::Owned(clean) => clean,
        }
    }

    fn decode_entities(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            match entity_name(after) {
                Some(name) => {
                    self.push_entity(&mut out, name);
                    rest = &after[name.len() + 1..];
                }
                None => {
                    out.push('&');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn push_entity(&self, out: &mut String, name: &str) {
        if let Some(text) = entities::xml_builtin(name) {
            out.push_str(text);
        } else if let Some(text) = self.entities.get(name) {
            out.push_str(text);
        } else if let Some(c) = entities::decode_numeric(name) {
            out.push(c);
        } else if let Some(text) = entities::named(name) {
            out.push_str(&text);
        } else {
            // Dropping the ';' keeps wrapped text free of stray punctuation
            out.push('&');
            out.push_str(name);
        }
    }
}

/// Convenience wrapper for one-off calls.
pub fn dejunk(raw: Option<&str>, entities: &EntityTable) -> String {
    Dejunker::new(entities).dejunk(raw)
}

/// Name of the `name;` reference at the start of `s`, if well formed.
fn entity_name(s: &str) -> Option<&str> {
    let end = s.bytes().take(MAX_ENTITY_LEN + 1).position(|b| b == b';')?;
    let name = &s[..end];
    let well_formed = !name.is_empty()
        && name
            .bytes()
            .enumerate()
            .all(|(i, b)| b.is_ascii_alphanumeric() || (i == 0 && b == b'#'));
    well_formed.then_some(name)
}

/// Turns `&lt;tag ...&gt;` back into `<tag ...>` where it looks like markup:
/// the name starts with a letter, `/` or `!` and a closing `&gt;` follows.
fn unescape_markup(raw: &str) -> Cow<'_, str> {
    const LT: &str = "&lt;";
    const GT: &str = "&gt;";

    if !raw.contains(LT) {
        return Cow::Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(LT) {
        let after = &rest[pos + LT.len()..];
        let starts_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        let close = if starts_tag {
            after.find(GT).filter(|&end| !after[..end].contains(LT))
        } else {
            None
        };

        match close {
            Some(end) => {
                out.push_str(&rest[..pos]);
                out.push('<');
                out.push_str(&after[..end]);
                out.push('>');
                rest = &after[end + GT.len()..];
            }
            None => {
                out.push_str(&rest[..pos + LT.len()]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn skip_leading_tags(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(tag) = rest.strip_prefix('<') {
        let end = tag.find('>')?;
        rest = &tag[end + 1..];
    }
    Some(rest)
}

fn classify(tag: &str) -> TagKind {
    let name: String = tag
        .trim_start_matches('/')
        .trim_start()
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    match name.as_str() {
        "p" | "br" => TagKind::Break,
        "img" | "image" => TagKind::Image,
        _ => TagKind::Other,
    }
}

fn strip_tags(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;

    loop {
        let Some(open) = rest.find('<') else {
            out.push_str(rest);
            break;
        };
        out.push_str(&rest[..open]);

        let tag_on = &rest[open + 1..];
        // An unterminated tag swallows the rest of the input
        let Some(close) = tag_on.find('>') else {
            break;
        };
        let tag = &tag_on[..close];
        let mut after = &tag_on[close + 1..];

        match classify(tag) {
            TagKind::Break => {
                if !after.starts_with('\n') {
                    out.push('\n');
                }
            }
            TagKind::Image => out.push_str(IMAGE_MARKER),
            TagKind::Other => {
                if out.ends_with(' ') && after.starts_with(' ') {
                    after = &after[1..];
                }
            }
        }
        rest = after;
    }
    out
}
