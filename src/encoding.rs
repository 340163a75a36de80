use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

/// https://www.rfc-editor.org/rfc/rfc3986#section-2.3
///
/// Everything outside of the unreserved set gets percent-encoded.
const RAW_URL: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a cookie name or value for the `Set-Cookie` header.
pub(crate) fn encode(string: &str) -> impl std::fmt::Display + '_ {
    percent_encoding::utf8_percent_encode(string, RAW_URL)
}
