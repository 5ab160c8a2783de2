use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left untouched when encoding a single path component
///
/// Matches the unreserved set of JavaScript's `encodeURIComponent`, which is
/// what the publisher API expects for document paths (`/` becomes `%2F`).
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Encodes a document or collection path for use as one URL path segment
///
/// # Examples
///
/// ```
/// use tei_sync::url::encode_component;
///
/// assert_eq!(encode_component("test/graves6.xml"), "test%2Fgraves6.xml");
/// ```
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
