use std::borrow::Cow;

use time::{Duration, OffsetDateTime};

use crate::errors::UnparseableDateError;
use crate::util::parse_date;
use crate::SameSite;

/// The raw, unvalidated attributes of a cookie.
///
/// `CookieFields` is how an HTTP response layer hands cookie intent over to
/// this crate: fill in the attributes you care about, then turn it into a
/// validated [`Cookie`] with [`Cookie::from_fields`] or hand it to
/// [`CookieJar::add_fields`].
///
/// Nothing is checked at this stage.
///
/// # Example
///
/// ```rust
/// use amaretti::{Cookie, CookieFields};
///
/// let fields = CookieFields::new("session")
///     .set_value("a1b2c3")
///     .set_domain(".Example.com")
///     .set_path("/app/")
///     .set_http_only(true);
/// let cookie = Cookie::from_fields(fields).unwrap();
/// assert_eq!(cookie.domain(), Some("example.com"));
/// assert_eq!(cookie.path(), "/app");
/// ```
///
/// [`Cookie`]: crate::Cookie
/// [`Cookie::from_fields`]: crate::Cookie::from_fields
/// [`CookieJar::add_fields`]: crate::CookieJar::add_fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieFields<'c> {
    pub(crate) name: Cow<'c, str>,
    /// `None` for a tombstone.
    pub(crate) value: Option<Cow<'c, str>>,
    pub(crate) domain: Option<Cow<'c, str>>,
    pub(crate) path: Option<Cow<'c, str>>,
    pub(crate) max_age: Option<Duration>,
    pub(crate) expires: Option<OffsetDateTime>,
    pub(crate) secure: Option<bool>,
    pub(crate) discard: bool,
    pub(crate) http_only: bool,
    pub(crate) same_site: Option<SameSite>,
}

impl<'c> CookieFields<'c> {
    /// Starts from a name and nothing else.
    ///
    /// Without a value, the resulting cookie is a tombstone: it asks the client
    /// to delete any cookie with the same name, domain and path.
    pub fn new<N: Into<Cow<'c, str>>>(name: N) -> Self {
        CookieFields {
            name: name.into(),
            value: None,
            domain: None,
            path: None,
            max_age: None,
            expires: None,
            secure: None,
            discard: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn set_value<V: Into<Cow<'c, str>>>(mut self, value: V) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Drops the value, turning the cookie into a tombstone.
    pub fn unset_value(mut self) -> Self {
        self.value = None;
        self
    }

    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn unset_domain(mut self) -> Self {
        self.domain = None;
        self
    }

    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn unset_path(mut self) -> Self {
        self.path = None;
        self
    }

    pub fn set_max_age<D: Into<Option<Duration>>>(mut self, max_age: D) -> Self {
        self.max_age = max_age.into();
        self
    }

    pub fn set_expires<T: Into<Option<OffsetDateTime>>>(mut self, expires: T) -> Self {
        self.expires = expires.into();
        self
    }

    /// Sets the expiration from a textual date, in any of the encodings
    /// accepted by [`parse_date`].
    ///
    /// ```rust
    /// use amaretti::CookieFields;
    ///
    /// assert!(CookieFields::new("id").set_expires_str("Sun, 06-Nov-1994 08:49:37 GMT").is_ok());
    /// assert!(CookieFields::new("id").set_expires_str("soon").is_err());
    /// ```
    ///
    /// [`parse_date`]: crate::util::parse_date
    pub fn set_expires_str(self, expires: &str) -> Result<Self, UnparseableDateError> {
        let expires = parse_date(expires)?;
        Ok(self.set_expires(expires))
    }

    /// `None` leaves the decision to the jar's default.
    pub fn set_secure<T: Into<Option<bool>>>(mut self, secure: T) -> Self {
        self.secure = secure.into();
        self
    }

    pub fn set_discard(mut self, discard: bool) -> Self {
        self.discard = discard;
        self
    }

    pub fn set_http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn set_same_site<T: Into<Option<SameSite>>>(mut self, same_site: T) -> Self {
        self.same_site = same_site.into();
        self
    }

    /// The cookie name, as provided.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a path was provided.
    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }
}
