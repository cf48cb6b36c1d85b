//! Validation of user-written identifiers.
//!
//! Generated branch labels embed [`LABEL_SIGIL`], which no valid identifier
//! may contain, so labels like `break$0` can never collide with a name the
//! user wrote.

/// Separator reserved for generated labels and instantiated internal names.
pub(crate) const LABEL_SIGIL: char = '$';

/// Whether `name` is a valid identifier: an XID start character (or `_`)
/// followed by XID continue characters.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || unicode_xid::UnicodeXID::is_xid_start(c) => (),
        _ => return false,
    }
    chars.all(|c| c != LABEL_SIGIL && unicode_xid::UnicodeXID::is_xid_continue(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_names() {
        assert!(is_valid_identifier("x"));
        assert!(is_valid_identifier("_private"));
        assert!(is_valid_identifier("someName2"));
    }

    #[test]
    fn rejects_label_shapes() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("2x"));
        assert!(!is_valid_identifier("break$0"));
        assert!(!is_valid_identifier("a b"));
    }
}
