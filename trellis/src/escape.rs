//! Escaping for text content and attribute values.
//!
//! Content is escaped once, when it is inserted into the tree. Serializers
//! write stored text verbatim, so anything passed through these functions
//! twice is escaped twice; use the raw insertion path for pre-escaped markup.

use std::borrow::Cow;

/// Escape `&`, `<` and `>` for use as element content.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    html_escape::encode_text(text)
}

/// Escape a value for use inside a quoted attribute.
///
/// On top of what [`escape_text`] does, both quote characters are escaped so
/// the value is safe whichever delimiter a reader expects.
pub fn escape_attr(value: &str) -> Cow<'_, str> {
    html_escape::encode_quoted_attribute(value)
}

/// Decode character references back into the characters they stand for.
pub fn unescape(text: &str) -> Cow<'_, str> {
    html_escape::decode_html_entities(text)
}

/// Whether `stored` is exactly what [`escape_text`] makes of its decoded form.
pub(crate) fn is_canonical_text(stored: &str) -> bool {
    escape_text(&unescape(stored)) == stored
}
