//! Stateless helpers to validate, normalize and serialize cookie attributes.
//!
//! [`Cookie`] relies on these functions to uphold its invariants, but they are
//! exposed for callers that need to check raw input before building a cookie.
//!
//! [`Cookie`]: crate::Cookie
use std::borrow::Cow;
use std::fmt;

use time::{Duration, OffsetDateTime};

use crate::date::CookieDate;
use crate::encoding::encode;
use crate::Cookie;

pub use crate::date::{format_date, parse_date};

/// How far in the past the `Expires` attribute of a tombstone is set:
/// one year and one second.
const EXPIRED_OFFSET: Duration = Duration::seconds(31_536_001);

/// Checks that `name` is a valid cookie name.
///
/// A cookie name must be a non-empty token, as defined in
/// [RFC 2616 section 2.2](https://tools.ietf.org/html/rfc2616#section-2.2):
/// US-ASCII characters only, no control characters and no separators.
///
/// # Example
///
/// ```rust
/// use amaretti::util::validate_name;
///
/// assert!(validate_name("session_id").is_ok());
/// assert!(validate_name("").is_err());
/// assert!(validate_name("a=b").is_err());
/// assert!(validate_name("a b").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<(), InvalidNameError> {
    if name.is_empty() {
        return Err(InvalidNameError {
            name: String::new(),
            invalid_char: None,
        });
    }
    match name.chars().find(|c| !is_token_char(*c)) {
        Some(c) => Err(InvalidNameError {
            name: name.to_string(),
            invalid_char: Some(c),
        }),
        None => Ok(()),
    }
}

fn is_token_char(c: char) -> bool {
    c.is_ascii()
        && !matches!(
            c,
            '\x00'..='\x20'
                | '"'
                | '('
                | ')'
                | ','
                | '/'
                | ':'..='@'
                | '['..=']'
                | '{'
                | '}'
                | '\x7f'
        )
}

/// Checks that `value` can be safely used as a cookie value.
///
/// A missing value (i.e. a tombstone) is always valid.
/// Otherwise the value is rejected if:
///
/// - it contains a line feed that isn't preceded by a carriage return, a
///   carriage return that isn't followed by a line feed, or a CRLF sequence
///   that isn't followed by a space or a horizontal tab. These are all header
///   injection attempts.
/// - it contains a character outside of the `cookie-octet` range of
///   [RFC 6265 section 4.1.1](https://tools.ietf.org/html/rfc6265#section-4.1.1).
///
/// # Example
///
/// ```rust
/// use amaretti::util::validate_value;
///
/// assert!(validate_value(Some("ok-value123")).is_ok());
/// assert!(validate_value(None).is_ok());
/// assert!(validate_value(Some("bad\r\nbad")).is_err());
/// assert!(validate_value(Some("no spaces")).is_err());
/// ```
pub fn validate_value(value: Option<&str>) -> Result<(), InvalidValueError> {
    let Some(value) = value else {
        return Ok(());
    };
    if has_bare_line_break(value) {
        return Err(InvalidValueError {
            value: value.to_string(),
            invalid_char: None,
        });
    }
    match value.chars().find(|c| !is_cookie_octet(*c)) {
        Some(c) => Err(InvalidValueError {
            value: value.to_string(),
            invalid_char: Some(c),
        }),
        None => Ok(()),
    }
}

fn is_cookie_octet(c: char) -> bool {
    matches!(
        c,
        '\x21' | '\x23'..='\x2B' | '\x2D'..='\x3A' | '\x3C'..='\x5B' | '\x5D'..='\x7E'
    )
}

/// A header continuation must be a CRLF followed by a space or a tab.
/// Anything else is a line break an attacker could use to inject headers.
fn has_bare_line_break(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.iter().enumerate().any(|(i, b)| match b {
        b'\n' => i == 0 || bytes[i - 1] != b'\r',
        b'\r' => match bytes.get(i + 1) {
            Some(b'\n') => !matches!(bytes.get(i + 2), Some(b' ' | b'\t')),
            _ => true,
        },
        _ => false,
    })
}

/// Checks that `max_age`, if set, is a whole number of seconds.
///
/// # Example
///
/// ```rust
/// use amaretti::util::validate_max_age;
/// use amaretti::time::Duration;
///
/// assert!(validate_max_age(None).is_ok());
/// assert!(validate_max_age(Some(Duration::seconds(3600))).is_ok());
/// assert!(validate_max_age(Some(Duration::milliseconds(1500))).is_err());
/// ```
pub fn validate_max_age(max_age: Option<Duration>) -> Result<(), InvalidMaxAgeError> {
    match max_age {
        Some(max_age) if max_age.subsec_nanoseconds() != 0 => Err(InvalidMaxAgeError { max_age }),
        _ => Ok(()),
    }
}

/// Lowercases `domain` and strips its leading dots, as required by
/// [RFC 6265 section 5.2.3](https://tools.ietf.org/html/rfc6265#section-5.2.3).
///
/// A domain containing a control character, a `;` or a non-ASCII character
/// could break out of the `Domain` attribute: it is normalized to the empty
/// string, which [`Cookie`] treats as no domain.
///
/// No allocation takes place if `domain` is borrowed and already lowercase.
///
/// # Example
///
/// ```rust
/// use amaretti::util::normalize_domain;
///
/// assert_eq!(normalize_domain("EXAMPLE.com"), "example.com");
/// assert_eq!(normalize_domain(".example.com"), "example.com");
/// ```
pub fn normalize_domain<'a>(domain: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
    let domain = domain.into();
    if !domain.chars().all(is_attribute_char) {
        return Cow::Borrowed("");
    }
    let start = domain.len() - domain.trim_start_matches('.').len();
    if domain[start..].bytes().any(|b| b.is_ascii_uppercase()) {
        return Cow::Owned(domain[start..].to_ascii_lowercase());
    }
    match domain {
        Cow::Borrowed(domain) => Cow::Borrowed(&domain[start..]),
        Cow::Owned(mut domain) => {
            domain.drain(..start);
            Cow::Owned(domain)
        }
    }
}

/// Normalizes a cookie path following
/// [RFC 6265 section 5.2.4](https://tools.ietf.org/html/rfc6265#section-5.2.4).
///
/// Trailing slashes are removed. If the result is empty, doesn't start
/// with a `/` or contains a control character, a `;` or a non-ASCII
/// character, the root path `/` is returned instead.
///
/// # Example
///
/// ```rust
/// use amaretti::util::normalize_path;
///
/// assert_eq!(normalize_path(""), "/");
/// assert_eq!(normalize_path("/a/"), "/a");
/// assert_eq!(normalize_path("x"), "/");
/// ```
pub fn normalize_path<'a>(path: impl Into<Cow<'a, str>>) -> Cow<'a, str> {
    let path = path.into();
    let trimmed = path.trim_end_matches('/');
    if !trimmed.starts_with('/') || !trimmed.chars().all(is_attribute_char) {
        return Cow::Borrowed("/");
    }
    let len = trimmed.len();
    match path {
        Cow::Borrowed(path) => Cow::Borrowed(&path[..len]),
        Cow::Owned(mut path) => {
            path.truncate(len);
            Cow::Owned(path)
        }
    }
}

/// Characters allowed in `Path` and `Domain`: printable US-ASCII, minus `;`.
/// Anything else could terminate the attribute or the header.
fn is_attribute_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && c != ';'
}

/// Renders `cookie` as the value of a `Set-Cookie` header.
///
/// Attributes are emitted in a fixed order, separated by `"; "`:
///
/// 1. `name=value`, both percent-encoded. A tombstone is rendered with
///    `deleted` as its value.
/// 2. `Expires` and `Max-Age`, if the cookie expires after the Unix epoch.
///    If `Max-Age` was not set, the number of seconds left until `Expires`
///    is used.
///    A tombstone without an expiration gets an `Expires` one year in the
///    past and `Max-Age=0`, to make sure the client deletes it.
/// 3. `Path`
/// 4. `Domain`, if set.
/// 5. `Secure`, if set to `true`.
/// 6. `HttpOnly`, if set.
/// 7. `SameSite`, if set.
///
/// This function never fails.
///
/// # Example
///
/// ```rust
/// use amaretti::{Cookie, CookieFields, SameSite};
/// use amaretti::util::to_string;
///
/// let cookie = Cookie::from_fields(
///     CookieFields::new("id")
///         .set_value("a1")
///         .set_domain("example.com")
///         .set_http_only(true)
///         .set_same_site(SameSite::Lax),
/// )
/// .unwrap();
/// assert_eq!(
///     to_string(&cookie),
///     "id=a1; Path=/; Domain=example.com; HttpOnly; SameSite=Lax"
/// );
/// ```
pub fn to_string(cookie: &Cookie<'_>) -> String {
    to_string_at(cookie, OffsetDateTime::now_utc())
}

/// Same as [`to_string`], using `now` as the current time when computing
/// `Max-Age` and the expiration of tombstones.
pub fn to_string_at(cookie: &Cookie<'_>, now: OffsetDateTime) -> String {
    HeaderValue { cookie, now }.to_string()
}

pub(crate) struct HeaderValue<'a, 'c> {
    pub(crate) cookie: &'a Cookie<'c>,
    pub(crate) now: OffsetDateTime,
}

impl fmt::Display for HeaderValue<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cookie = self.cookie;
        write!(
            f,
            "{}={}",
            encode(cookie.name()),
            encode(cookie.value().unwrap_or("deleted"))
        )?;

        if let Some(expires) = cookie.expires().filter(|e| e.unix_timestamp() > 0) {
            let max_age = match cookie.max_age() {
                Some(max_age) => max_age.whole_seconds(),
                None => (expires - self.now).whole_seconds().max(0),
            };
            write!(f, "; Expires={}; Max-Age={}", CookieDate(expires), max_age)?;
        } else if cookie.is_tombstone()
            && cookie.expires().map_or(true, |e| e.unix_timestamp() == 0)
        {
            write!(
                f,
                "; Expires={}; Max-Age=0",
                CookieDate(self.now - EXPIRED_OFFSET)
            )?;
        }

        if !cookie.path().is_empty() {
            write!(f, "; Path={}", cookie.path())?;
        }

        if let Some(domain) = cookie.domain() {
            write!(f, "; Domain={}", domain)?;
        }

        if cookie.secure() == Some(true) {
            f.write_str("; Secure")?;
        }

        if cookie.http_only() {
            f.write_str("; HttpOnly")?;
        }

        if let Some(same_site) = cookie.same_site() {
            write!(f, "; SameSite={}", same_site)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", invalid_name_message(.name, .invalid_char))]
/// The error returned by [`validate_name`].
pub struct InvalidNameError {
    name: String,
    invalid_char: Option<char>,
}

impl InvalidNameError {
    /// The rejected name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn invalid_name_message(name: &str, invalid_char: &Option<char>) -> String {
    match invalid_char {
        None => "The name of a cookie cannot be empty".to_string(),
        Some(c) => format!("The cookie name {name:?} contains an invalid character: {c:?}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", invalid_value_message(.value, .invalid_char))]
/// The error returned by [`validate_value`].
pub struct InvalidValueError {
    value: String,
    /// `None` if the value was rejected because of a line break.
    invalid_char: Option<char>,
}

impl InvalidValueError {
    /// The rejected value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Returns `true` if the value was rejected because it looked like a
    /// header injection attempt.
    pub fn is_header_injection(&self) -> bool {
        self.invalid_char.is_none()
    }
}

fn invalid_value_message(value: &str, invalid_char: &Option<char>) -> String {
    match invalid_char {
        None => format!(
            "The cookie value {value:?} contains a line break that isn't a valid header continuation"
        ),
        Some(c) => format!("The cookie value {value:?} contains an invalid character: {c:?}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Max-Age must be a whole number of seconds, but it was set to {max_age}")]
/// The error returned by [`validate_max_age`].
pub struct InvalidMaxAgeError {
    max_age: Duration,
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use googletest::prelude::*;
    use time::macros::datetime;
    use time::Duration;

    use super::*;
    use crate::{Cookie, CookieFields, SameSite};

    #[test]
    fn names() {
        assert!(validate_name("session_id").is_ok());
        assert!(validate_name("Session-ID.2!#$%&'*+^`|~").is_ok());

        assert_that!(
            validate_name(""),
            err(displays_as(eq("The name of a cookie cannot be empty")))
        );
        assert_that!(
            validate_name("a=b"),
            err(displays_as(eq(
                "The cookie name \"a=b\" contains an invalid character: '='"
            )))
        );
        for invalid in [
            "a,b", "a;b", "a b", "a\tb", "a\rb", "a\nb", "a\x0bb", "a\x0cb", "a\"b", "a(b",
            "a/b", "a:b", "a?b", "a@b", "a[b", "a\\b", "a{b", "a}b", "a\x7fb", "naïve",
        ] {
            assert!(validate_name(invalid).is_err(), "{invalid:?} was accepted");
        }
    }

    #[test]
    fn values() {
        assert!(validate_value(None).is_ok());
        assert!(validate_value(Some("")).is_ok());
        assert!(validate_value(Some("ok-value123")).is_ok());
        assert!(validate_value(Some("!#$%&'()*+-./:<=>?@[]^_`{|}~")).is_ok());

        for injection in ["bad\r\nbad", "bad\nbad", "bad\rbad", "bad\r\n", "\nbad"] {
            let err = validate_value(Some(injection)).unwrap_err();
            assert!(err.is_header_injection(), "{injection:?}");
        }
        // A valid header continuation is still not a valid cookie value.
        let err = validate_value(Some("a\r\n b")).unwrap_err();
        assert!(!err.is_header_injection());

        for invalid in ["a b", "a\"b", "a,b", "a;b", "a\\b", "a\tb", "a\x7fb", "é"] {
            let err = validate_value(Some(invalid)).unwrap_err();
            assert!(!err.is_header_injection(), "{invalid:?}");
        }
        assert_that!(
            validate_value(Some("a;b")),
            googletest::matchers::err(displays_as(eq(
                "The cookie value \"a;b\" contains an invalid character: ';'"
            )))
        );
    }

    #[test]
    fn max_ages() {
        assert!(validate_max_age(None).is_ok());
        assert!(validate_max_age(Some(Duration::ZERO)).is_ok());
        assert!(validate_max_age(Some(Duration::seconds(-10))).is_ok());
        assert!(validate_max_age(Some(Duration::seconds_f64(0.5))).is_err());
    }

    #[test]
    fn domains() {
        assert_eq!(normalize_domain("EXAMPLE.com"), "example.com");
        assert_eq!(normalize_domain(".example.com"), "example.com");
        assert_eq!(normalize_domain("..Example.COM"), "example.com");
        assert_eq!(normalize_domain(String::from(".example.com")), "example.com");
        assert!(matches!(
            normalize_domain(".example.com"),
            Cow::Borrowed("example.com")
        ));

        for unsafe_domain in ["x.com\r\nSet-Cookie: admin=1", "x.com; Secure", "x.com\0", "exämple.com"] {
            assert_eq!(normalize_domain(unsafe_domain), "", "{unsafe_domain:?}");
        }
    }

    #[test]
    fn paths() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("//"), "/");
        assert_eq!(normalize_path("/a/"), "/a");
        assert_eq!(normalize_path("/a/b//"), "/a/b");
        assert_eq!(normalize_path("x"), "/");
        assert_eq!(normalize_path("x/y/"), "/");
        assert_eq!(normalize_path(String::from("/a/")), "/a");

        for unsafe_path in ["/a\r\nSet-Cookie: admin=1", "/a\nb", "/a;b", "/a\tb", "/é"] {
            assert_eq!(normalize_path(unsafe_path), "/", "{unsafe_path:?}");
        }
    }

    fn cookie(fields: CookieFields<'static>) -> Cookie<'static> {
        Cookie::from_fields(fields).unwrap()
    }

    #[test]
    fn format() {
        let now = datetime!(2015-10-21 07:28:00 UTC);

        let c = cookie(CookieFields::new("foo").set_value("bar"));
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/");

        let c = cookie(CookieFields::new("foo").set_value("b%r"));
        assert_eq!(to_string_at(&c, now), "foo=b%25r; Path=/");

        let c = cookie(CookieFields::new("foo").set_value("bar").set_path("/a/"));
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/a");

        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_domain(".Rust-Lang.org"),
        );
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/; Domain=rust-lang.org");

        let c = cookie(CookieFields::new("foo").set_value("bar").set_secure(true));
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/; Secure");

        let c = cookie(CookieFields::new("foo").set_value("bar").set_secure(false));
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/");

        let c = cookie(CookieFields::new("foo").set_value("bar").set_http_only(true));
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/; HttpOnly");

        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_same_site(SameSite::Strict),
        );
        assert_eq!(to_string_at(&c, now), "foo=bar; Path=/; SameSite=Strict");

        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_domain("example.com")
                .set_secure(true)
                .set_http_only(true)
                .set_same_site(SameSite::None),
        );
        assert_eq!(
            to_string_at(&c, now),
            "foo=bar; Path=/; Domain=example.com; Secure; HttpOnly; SameSite=None"
        );
    }

    #[test]
    fn format_expiration() {
        let now = datetime!(2015-10-21 07:28:00 UTC);

        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_expires(now + Duration::hours(1)),
        );
        assert_eq!(
            to_string_at(&c, now),
            "foo=bar; Expires=Wed, 21-Oct-2015 08:28:00 GMT; Max-Age=3600; Path=/"
        );

        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_max_age(Duration::seconds(60))
                .set_expires(now + Duration::hours(1)),
        );
        assert_eq!(
            to_string_at(&c, now),
            "foo=bar; Expires=Wed, 21-Oct-2015 08:28:00 GMT; Max-Age=60; Path=/"
        );

        // Already expired: Max-Age never goes negative.
        let c = cookie(
            CookieFields::new("foo")
                .set_value("bar")
                .set_expires(now - Duration::hours(1)),
        );
        assert_eq!(
            to_string_at(&c, now),
            "foo=bar; Expires=Wed, 21-Oct-2015 06:28:00 GMT; Max-Age=0; Path=/"
        );
    }

    #[test]
    fn format_tombstone() {
        let now = datetime!(2015-10-21 07:28:00 UTC);

        let c = cookie(CookieFields::new("foo").set_domain("example.com"));
        assert_eq!(
            to_string_at(&c, now),
            "foo=deleted; Expires=Tue, 21-Oct-2014 07:27:59 GMT; Max-Age=0; Path=/; Domain=example.com"
        );

        // An explicit expiration takes precedence over the expired marker.
        let c = cookie(
            CookieFields::new("foo").set_expires(now + Duration::seconds(10)),
        );
        assert_eq!(
            to_string_at(&c, now),
            "foo=deleted; Expires=Wed, 21-Oct-2015 07:28:10 GMT; Max-Age=10; Path=/"
        );
    }

    #[test]
    fn expires_survives_a_roundtrip() {
        let expires = datetime!(2031-02-03 04:05:06.789 UTC);
        let c = cookie(CookieFields::new("foo").set_value("bar").set_expires(expires));
        let header = to_string(&c);
        let raw = header
            .split("; ")
            .find_map(|attribute| attribute.strip_prefix("Expires="))
            .unwrap();
        let parsed = parse_date(raw).unwrap();
        assert!((parsed - expires).abs() < Duration::seconds(1));
    }
}
