use std::borrow::Cow;

use crate::util::{normalize_domain, normalize_path};

/// The identity of a [`Cookie`]: its name, domain and path.
///
/// Two cookies with the same key refer to the same client-side cookie.
/// Names are compared case-insensitively, while domains and paths are
/// compared after normalization.
///
/// # Example
///
/// ```
/// use amaretti::CookieKey;
///
/// let key = CookieKey::new("Session");
/// assert_eq!(key.name(), "session");
/// assert_eq!(key.domain(), None);
/// assert_eq!(key.path(), "/");
///
/// let key = CookieKey::new("session").set_domain(".Rust-Lang.org").set_path("/docs/");
/// assert_eq!(key.domain(), Some("rust-lang.org"));
/// assert_eq!(key.path(), "/docs");
/// ```
///
/// [`Cookie`]: crate::Cookie
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct CookieKey<'c> {
    /// ASCII-lowercased.
    name: Cow<'c, str>,
    domain: Option<Cow<'c, str>>,
    path: Cow<'c, str>,
}

impl<'c> CookieKey<'c> {
    /// Creates a new [`CookieKey`] for a cookie with the given name, no
    /// domain and the root path.
    pub fn new<N: Into<Cow<'c, str>>>(name: N) -> CookieKey<'c> {
        CookieKey {
            name: fold_case(name.into()),
            domain: None,
            path: Cow::Borrowed("/"),
        }
    }

    /// Builds a key out of attributes that are already normalized.
    pub(crate) fn from_normalized(
        name: Cow<'c, str>,
        domain: Option<Cow<'c, str>>,
        path: Cow<'c, str>,
    ) -> CookieKey<'c> {
        CookieKey {
            name: fold_case(name),
            domain,
            path,
        }
    }

    pub fn set_domain<D: Into<Cow<'c, str>>>(mut self, domain: D) -> CookieKey<'c> {
        self.domain = Some(normalize_domain(domain)).filter(|d| !d.is_empty());
        self
    }

    pub fn unset_domain(mut self) -> CookieKey<'c> {
        self.domain = None;
        self
    }

    pub fn set_path<P: Into<Cow<'c, str>>>(mut self, path: P) -> CookieKey<'c> {
        self.path = normalize_path(path);
        self
    }

    /// Returns the lowercased name of the cookie.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    #[inline]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    #[inline]
    pub fn path(&self) -> &str {
        self.path.as_ref()
    }
}

fn fold_case(name: Cow<'_, str>) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        name
    }
}

impl<'a> From<&'a str> for CookieKey<'a> {
    fn from(name: &'a str) -> CookieKey<'a> {
        CookieKey::new(name)
    }
}
