use std::borrow::Cow;
use std::fmt;

use time::macros::datetime;
use time::{Duration, OffsetDateTime};

use crate::util::{
    normalize_domain, normalize_path, validate_max_age, validate_name, validate_value,
    HeaderValue, InvalidMaxAgeError, InvalidNameError, InvalidValueError,
};
use crate::{CookieFields, CookieKey, SameSite};

/// RFC 6265 requires dates not to exceed 9999 years.
static MAX_DATETIME: OffsetDateTime = datetime!(9999-12-31 23:59:59.999_999 UTC);
/// Where a negative `Max-Age` too large to subtract from the current time
/// lands. It must stay after the epoch to be rendered as `Expires`.
static MIN_DATETIME: OffsetDateTime = datetime!(1970-01-01 00:00:01 UTC);

/// A validated HTTP cookie, ready to be sent to a client with a `Set-Cookie`
/// header.
///
/// ## Constructing a `Cookie`
///
/// There are two ways to get hold of a `Cookie`:
///
/// - From raw attributes, with [`Cookie::from_fields`] (or its shorthands
///   [`Cookie::new`] and [`Cookie::removal`]).
/// - As a copy of another cookie, with [`Cookie::from_existing`].
///
/// Construction either succeeds with a cookie that upholds all the invariants
/// below, or fails without producing anything:
///
/// - the name is a valid token (see [`validate_name`]);
/// - the value, if any, is made of valid cookie characters and can't be used
///   for header injection (see [`validate_value`]);
/// - `Max-Age`, if any, is a whole number of seconds;
/// - the domain, if any, is lowercase and has no leading dot;
/// - the path starts with `/` and has no trailing `/`, unless it's the root.
///
/// ```rust
/// use amaretti::{Cookie, CookieFields};
///
/// let cookie = Cookie::from_fields(
///     CookieFields::new("x").set_value("v").set_domain(".EXAMPLE.com"),
/// ).unwrap();
/// assert_eq!(cookie.domain(), Some("example.com"));
///
/// assert!(Cookie::new("a=b", "v").is_err());
/// ```
///
/// ## Tombstones
///
/// A cookie without a value is a tombstone: it expresses the intent to delete
/// the client-side cookie with the same name, domain and path.
///
/// ## Immutability
///
/// A `Cookie` cannot be modified after construction. [`Cookie::with_domain`]
/// and [`Cookie::with_secure`] consume the cookie and return a derived one.
///
/// [`validate_name`]: crate::util::validate_name
/// [`validate_value`]: crate::util::validate_value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie<'c> {
    pub(crate) name: Cow<'c, str>,
    pub(crate) value: Option<Cow<'c, str>>,
    pub(crate) domain: Option<Cow<'c, str>>,
    pub(crate) path: Cow<'c, str>,
    pub(crate) max_age: Option<Duration>,
    pub(crate) expires: Option<OffsetDateTime>,
    /// `None` if it was never set, so that a jar default can apply.
    pub(crate) secure: Option<bool>,
    pub(crate) http_only: bool,
    pub(crate) discard: bool,
    pub(crate) same_site: Option<SameSite>,
}

impl<'c> Cookie<'c> {
    /// Creates a new [`Cookie`] with the given name and value, and no other
    /// attribute.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::Cookie;
    ///
    /// let cookie = Cookie::new("name", "value").unwrap();
    /// assert_eq!(cookie.name(), "name");
    /// assert_eq!(cookie.value(), Some("value"));
    /// assert_eq!(cookie.path(), "/");
    /// ```
    pub fn new<N, V>(name: N, value: V) -> Result<Self, CookieError>
    where
        N: Into<Cow<'c, str>>,
        V: Into<Cow<'c, str>>,
    {
        Self::from_fields(CookieFields::new(name).set_value(value))
    }

    /// Creates a tombstone for the cookie with the given name.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::Cookie;
    ///
    /// let cookie = Cookie::removal("name").unwrap();
    /// assert!(cookie.is_tombstone());
    /// assert!(cookie.to_string().starts_with("name=deleted; Expires="));
    /// ```
    pub fn removal<N: Into<Cow<'c, str>>>(name: N) -> Result<Self, CookieError> {
        Self::from_fields(CookieFields::new(name))
    }

    /// Validates and normalizes `fields` into a [`Cookie`].
    ///
    /// - The name, value and `Max-Age` are validated.
    /// - The domain is normalized. An empty domain counts as no domain.
    /// - The path is normalized, falling back to `/`.
    /// - If `Max-Age` is set but `Expires` isn't, `Expires` is computed from
    ///   the current time.
    /// - `Expires` is capped to the end of year 9999.
    pub fn from_fields(fields: CookieFields<'c>) -> Result<Self, CookieError> {
        let CookieFields {
            name,
            value,
            domain,
            path,
            max_age,
            expires,
            secure,
            discard,
            http_only,
            same_site,
        } = fields;

        validate_name(&name)?;
        validate_value(value.as_deref())?;
        validate_max_age(max_age)?;

        let domain = domain.map(normalize_domain).filter(|d| !d.is_empty());
        let path = normalize_path(path.unwrap_or(Cow::Borrowed("/")));
        let expires = expires
            .or_else(|| {
                max_age.map(|max_age| {
                    OffsetDateTime::now_utc()
                        .checked_add(max_age)
                        .unwrap_or(if max_age.is_negative() {
                            MIN_DATETIME
                        } else {
                            MAX_DATETIME
                        })
                })
            })
            .map(|expires| std::cmp::min(expires, MAX_DATETIME));

        Ok(Cookie {
            name,
            value,
            domain,
            path,
            max_age,
            expires,
            secure,
            http_only,
            discard,
            same_site,
        })
    }

    /// Creates a copy of `cookie`.
    pub fn from_existing(cookie: &Cookie<'c>) -> Self {
        cookie.clone()
    }

    /// Converts `self` into a `Cookie` with a `'static` lifetime with as few
    /// allocations as possible.
    pub fn into_owned(self) -> Cookie<'static> {
        let to_owned = |s: Cow<'c, str>| match s {
            Cow::Borrowed(s) => Cow::Owned(s.to_owned()),
            Cow::Owned(s) => Cow::Owned(s),
        };
        Cookie {
            name: to_owned(self.name),
            value: self.value.map(to_owned),
            domain: self.domain.map(to_owned),
            path: to_owned(self.path),
            max_age: self.max_age,
            expires: self.expires,
            secure: self.secure,
            http_only: self.http_only,
            discard: self.discard,
            same_site: self.same_site,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    /// Returns the value of `self`, or `None` for a tombstone.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns `true` if `self` has no value.
    #[inline]
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Returns the normalized domain of `self`, if any.
    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.path.as_ref()
    }

    #[inline]
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age
    }

    #[inline]
    pub fn expires(&self) -> Option<OffsetDateTime> {
        self.expires
    }

    /// `None` means that the attribute was left unset.
    #[inline]
    pub fn secure(&self) -> Option<bool> {
        self.secure
    }

    #[inline]
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    #[inline]
    pub fn discard(&self) -> bool {
        self.discard
    }

    #[inline]
    pub fn same_site(&self) -> Option<SameSite> {
        self.same_site
    }

    /// Returns the identity of `self`: its name, domain and path.
    pub fn key(&self) -> CookieKey<'c> {
        CookieKey::from_normalized(
            self.name.clone(),
            self.domain.clone(),
            self.path.clone(),
        )
    }

    /// Returns `true` if `self` and `other` refer to the same logical cookie,
    /// i.e. they share name (case-insensitively), domain and path.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::{Cookie, CookieFields};
    ///
    /// let a = Cookie::new("Session", "1").unwrap();
    /// let b = Cookie::new("session", "2").unwrap();
    /// assert!(a.matches(&b));
    ///
    /// let c = Cookie::from_fields(CookieFields::new("session").set_value("1").set_path("/app")).unwrap();
    /// assert!(!a.matches(&c));
    /// ```
    pub fn matches(&self, other: &Cookie<'_>) -> bool {
        self.key() == other.key()
    }

    /// Returns a copy of `self` with its domain set to `domain`, normalized.
    pub fn with_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> Self {
        self.domain = Some(normalize_domain(domain)).filter(|d| !d.is_empty());
        self
    }

    /// Returns a copy of `self` with its `Secure` attribute set to `secure`.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }
}

impl<'c> TryFrom<CookieFields<'c>> for Cookie<'c> {
    type Error = CookieError;

    fn try_from(fields: CookieFields<'c>) -> Result<Self, Self::Error> {
        Cookie::from_fields(fields)
    }
}

/// Renders the `Set-Cookie` header value, see [`util::to_string`].
///
/// [`util::to_string`]: crate::util::to_string
impl fmt::Display for Cookie<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = HeaderValue {
            cookie: self,
            now: OffsetDateTime::now_utc(),
        };
        fmt::Display::fmt(&header, f)
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
/// The error returned when the attributes of a cookie fail validation.
pub enum CookieError {
    #[error(transparent)]
    InvalidName(#[from] InvalidNameError),
    #[error(transparent)]
    InvalidValue(#[from] InvalidValueError),
    #[error(transparent)]
    InvalidMaxAge(#[from] InvalidMaxAgeError),
}
