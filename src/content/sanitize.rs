/// How much of a field's embedded whitespace survives cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupMode {
    /// Keep embedded newlines. Used for descriptions.
    Minimal,
    /// Fold embedded newlines into spaces. Used for titles and links.
    Aggressive,
}

/// Normalizes whitespace in a freshly extracted text field, in place.
///
/// Removes the leading run of spaces, tabs and newlines and the trailing run
/// of spaces, then turns every tab into a space. [`CleanupMode::Aggressive`]
/// also turns every newline into a space. Only the ASCII bytes `' '`, `'\t'`
/// and `'\n'` are ever touched, so multi-byte UTF-8 passes through intact.
pub fn sanitize(text: &mut String, mode: CleanupMode) {
    if text.is_empty() {
        return;
    }

    let leading = text
        .bytes()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\n'))
        .count();
    text.drain(..leading);

    let trailing = text.bytes().rev().take_while(|&b| b == b' ').count();
    text.truncate(text.len() - trailing);

    let fold_newlines = mode == CleanupMode::Aggressive;
    if text.bytes().any(|b| b == b'\t' || (fold_newlines && b == b'\n')) {
        *text = text
            .chars()
            .map(|c| match c {
                '\t' => ' ',
                '\n' if fold_newlines => ' ',
                c => c,
            })
            .collect();
    }
}

/// [`sanitize`] for optional fields; an absent value is left absent.
pub fn sanitize_opt(text: &mut Option<String>, mode: CleanupMode) {
    if let Some(text) = text.as_mut() {
        sanitize(text, mode);
    }
}

/// Owned, sanitized copy of `text`.
pub fn sanitized(text: &str, mode: CleanupMode) -> String {
    let mut owned = text.to_owned();
    sanitize(&mut owned, mode);
    owned
}
