use crate::util::{display_width, truncate_to_width};

/// Narrowest width honoured; anything smaller is raised to this.
pub const MIN_WIDTH: usize = 4;

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

/// Word-wraps `text` to `width` terminal columns.
///
/// Each `\n`-separated paragraph is wrapped on its own and blank paragraphs
/// survive as empty lines. Words are packed greedily, one space apart. A word
/// wider than the whole line gets a line to itself, truncated with `...`.
///
/// Wrapping is idempotent: feeding the output back in with the same width
/// yields the same text.
///
/// ```
/// use flurry::content::wrap;
///
/// assert_eq!(wrap("the quick brown fox", 10), "the quick\nbrown fox");
/// ```
pub fn wrap(text: &str, width: usize) -> String {
    wrap_lines(text, width).join("\n")
}

/// Like [`wrap`] but returns the lines unjoined.
pub fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(MIN_WIDTH);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        wrap_paragraph(paragraph, width, &mut lines);
    }
    lines
}

fn wrap_paragraph(paragraph: &str, width: usize, lines: &mut Vec<String>) {
    let mut line = String::new();
    let mut line_width = 0;
    let mut emitted = false;

    for word in paragraph.split(is_blank).filter(|w| !w.is_empty()) {
        let word_width = display_width(word);

        if word_width > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            lines.push(truncate_to_width(word, width).into_owned());
            emitted = true;
            continue;
        }

        if line.is_empty() {
            line.push_str(word);
            line_width = word_width;
        } else if line_width + 1 + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += 1 + word_width;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_owned()));
            line_width = word_width;
        }
    }

    if !line.is_empty() || !emitted {
        lines.push(line);
    }
}
