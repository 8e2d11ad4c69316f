use sha2::{Digest, Sha256};

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 64;

/// SHA-256 over the present fields, concatenated with no separator.
///
/// Absent fields contribute nothing, so `[Some("ab"), None]` and
/// `[Some("a"), Some("b")]` collide. That is accepted: feeds rarely split
/// the same text differently across title, link and guid, and changing the
/// scheme would reset the read state of every cached item.
///
/// ```
/// use flurry::feed::fingerprint;
///
/// let a = fingerprint(&[Some("Title"), Some("https://e.com/1"), None]);
/// let b = fingerprint(&[Some("Title"), Some("https://e.com/1"), None]);
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn fingerprint(fields: &[Option<&str>]) -> String {
    let mut hasher = Sha256::new();
    for field in fields.iter().flatten() {
        hasher.update(field.as_bytes());
    }
    format!("{:x}", hasher.finalize())
}

/// Identity of an item: title, link and guid, in that order.
pub fn item_fingerprint(title: Option<&str>, link: Option<&str>, guid: Option<&str>) -> String {
    fingerprint(&[title, link, guid])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_digest() {
        // sha256("abc")
        assert_eq!(
            fingerprint(&[Some("abc")]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_absent_fields_contribute_nothing() {
        assert_eq!(
            item_fingerprint(Some("abc"), None, None),
            fingerprint(&[Some("abc")])
        );
        // sha256("")
        assert_eq!(
            fingerprint(&[None, None]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_no_separator_between_fields() {
        assert_eq!(
            fingerprint(&[Some("ab"), Some("c")]),
            fingerprint(&[Some("a"), Some("bc")])
        );
    }

    #[test]
    fn test_field_change_changes_hash() {
        let base = item_fingerprint(Some("t"), Some("l"), Some("g"));
        assert_ne!(base, item_fingerprint(Some("t2"), Some("l"), Some("g")));
        assert_ne!(base, item_fingerprint(Some("t"), Some("l"), None));
    }

    proptest! {
        #[test]
        fn prop_deterministic_lowercase_hex(title in ".*", link in proptest::option::of(".*")) {
            let a = item_fingerprint(Some(&title), link.as_deref(), None);
            let b = item_fingerprint(Some(&title), link.as_deref(), None);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), FINGERPRINT_LEN);
            prop_assert!(a.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        }
    }
}
