//! Entity tables consulted by the dejunker, in lookup order: XML built-ins,
//! the user's table, numeric references, then well-known HTML names.

use std::borrow::Cow;
use std::collections::HashMap;

/// User-defined entity conversions (`name` -> replacement text).
///
/// Names are stored without the surrounding `&` and `;`. Loaded from the
/// `[entities]` table of the config file and passed to the dejunker
/// explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityTable {
    map: HashMap<String, String>,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a conversion. A leading `&` or trailing `;` on the
    /// name is tolerated and dropped.
    pub fn insert(&mut self, name: &str, replacement: impl Into<String>) {
        let name = name.trim_start_matches('&').trim_end_matches(';');
        self.map.insert(name.to_owned(), replacement.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl From<HashMap<String, String>> for EntityTable {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

impl FromIterator<(String, String)> for EntityTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, replacement) in iter {
            table.insert(&name, replacement);
        }
        table
    }
}

/// The five entities XML itself defines.
pub(crate) fn xml_builtin(name: &str) -> Option<&'static str> {
    match name {
        "amp" => Some("&"),
        "lt" => Some("<"),
        "gt" => Some(">"),
        "quot" => Some("\""),
        "apos" => Some("'"),
        _ => None,
    }
}

/// Code points 0x80..=0x9F as Windows-1252, which is what feeds that emit
/// `&#146;` and friends actually mean. `None` marks the five unassigned slots.
const WINDOWS_1252_C1: [Option<char>; 32] = [
    Some('\u{20ac}'),
    None,
    Some('\u{201a}'),
    Some('\u{0192}'),
    Some('\u{201e}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02c6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017d}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201c}'),
    Some('\u{201d}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02dc}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203a}'),
    Some('\u{0153}'),
    None,
    Some('\u{017e}'),
    Some('\u{0178}'),
];

/// Decodes `#NNN` (decimal) or `#xHH` (hex). Returns `None` for malformed
/// digits, NUL, surrogates, out-of-range values and unassigned C1 slots.
pub(crate) fn decode_numeric(name: &str) -> Option<char> {
    let digits = name.strip_prefix('#')?;
    let (digits, radix) = match digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let code = u32::from_str_radix(digits, radix).ok()?;
    match code {
        0 => None,
        0x80..=0x9f => WINDOWS_1252_C1[(code - 0x80) as usize],
        _ => char::from_u32(code),
    }
}

/// Well-known HTML named entities, for when no other table matched.
///
/// The common typographic names are answered locally; the long tail of the
/// HTML5 list goes through `html-escape`.
pub(crate) fn named(name: &str) -> Option<Cow<'static, str>> {
    let common = match name {
        "nbsp" => " ",
        "hellip" => "\u{2026}",
        "mdash" => "\u{2014}",
        "ndash" => "\u{2013}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "euro" => "\u{20ac}",
        "pound" => "\u{a3}",
        "deg" => "\u{b0}",
        "times" => "\u{d7}",
        _ => "",
    };
    if !common.is_empty() {
        return Some(Cow::Borrowed(common));
    }

    let reference = format!("&{name};");
    match html_escape::decode_html_entities(&reference) {
        Cow::Owned(decoded) if decoded != reference => Some(Cow::Owned(decoded)),
        _ => None,
    }
}
