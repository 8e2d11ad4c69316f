use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

/// Marker appended to text cut short by [`truncate_to_width`].
pub const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Number of terminal columns `s` occupies.
///
/// Summed per character so that it agrees exactly with the cut points chosen
/// by [`truncate_to_width`]: CJK and emoji count 2, combining marks 0.
///
/// ```
/// use flurry::util::display_width;
///
/// assert_eq!(display_width("Hello"), 5);
/// assert_eq!(display_width("你好"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Byte index of the end of the longest prefix of `s` fitting in `max_width`.
fn fitting_prefix(s: &str, max_width: usize) -> usize {
    let mut used = 0;
    for (idx, c) in s.char_indices() {
        let w = char_width(c);
        if used + w > max_width {
            return idx;
        }
        used += w;
    }
    s.len()
}

/// Truncates `s` to at most `max_width` columns, marking the cut with `...`.
///
/// Text that already fits comes back borrowed. When cut, the visible text is
/// `max_width - 3` columns followed by the ellipsis. At three columns or fewer
/// there is no room for both, so the text is cut without a marker.
///
/// ```
/// use flurry::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Short", 10), "Short");
/// assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
/// assert_eq!(truncate_to_width("Test", 2), "Te");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width <= ELLIPSIS_WIDTH {
        return Cow::Owned(s[..fitting_prefix(s, max_width)].to_owned());
    }

    let cut = fitting_prefix(s, max_width - ELLIPSIS_WIDTH);
    let mut out = String::with_capacity(cut + ELLIPSIS.len());
    out.push_str(&s[..cut]);
    out.push_str(ELLIPSIS);
    Cow::Owned(out)
}

fn is_control(c: char) -> bool {
    (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r')) || ('\u{80}'..='\u{9f}').contains(&c)
}

/// SEC-001: Strip terminal control characters and ANSI escape sequences.
///
/// Feed text is attacker-controlled and ends up on a terminal. CSI sequences
/// (`ESC [` .. final byte), OSC sequences (`ESC ]` .. BEL or `ESC \`), bare ESC,
/// C0 controls other than tab/newline/CR, DEL and the C1 range are removed.
///
/// Returns `Cow::Borrowed` when nothing needs stripping.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\x1b' => match chars.peek() {
                Some('[') => {
                    chars.next();
                    for c in chars.by_ref() {
                        if ('\x40'..='\x7e').contains(&c) {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(c) = chars.next() {
                        if c == '\x07' {
                            break;
                        }
                        if c == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                _ => {}
            },
            c if is_control(c) => {}
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}
