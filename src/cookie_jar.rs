use std::borrow::Cow;
use std::collections::HashMap;

use time::Duration;

use crate::config::JarConfig;
use crate::jar::Iter;
use crate::{util, Cookie, CookieError, CookieFields, CookieKey};

/// The set of cookies queued to be sent to the client with `Set-Cookie`
/// headers.
///
/// A jar holds at most one cookie per [`CookieKey`]: adding a cookie that
/// shares name (case-insensitively), domain and path with a stored one
/// resolves the conflict, see [`CookieJar::add_cookie`].
///
/// # Defaults
///
/// A jar can fill in the path, domain and `Secure` attribute of the cookies
/// it receives, see [`CookieJar::set_default_path_and_domain`] and
/// [`JarConfig`].
///
/// # Ordering
///
/// Iteration order is unspecified and may change between calls that mutate
/// the jar.
///
/// # Concurrency
///
/// The jar is not synchronized. Mutation goes through `&mut self`: if you
/// need to share a jar across threads, wrap it in a lock of your choice.
///
/// # Example
///
/// ```rust
/// use amaretti::{CookieFields, CookieJar};
///
/// let mut jar = CookieJar::new();
/// jar.add_fields(CookieFields::new("id").set_value("1").set_domain("x.com")).unwrap();
/// jar.add_fields(CookieFields::new("id").set_value("2").set_domain("x.com")).unwrap();
/// assert_eq!(jar.count(), 1);
/// assert_eq!(jar.get_cookie_by_name("ID").unwrap().value(), Some("2"));
///
/// // A cookie without a value removes its stored counterpart.
/// jar.add_fields(CookieFields::new("id").set_domain("x.com")).unwrap();
/// assert_eq!(jar.count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct CookieJar<'c> {
    cookies: HashMap<CookieKey<'c>, Cookie<'c>>,
    default_path: Cow<'c, str>,
    default_domain: Option<Cow<'c, str>>,
    default_secure: bool,
}

impl Default for CookieJar<'_> {
    fn default() -> Self {
        CookieJar {
            cookies: HashMap::new(),
            default_path: Cow::Borrowed("/"),
            default_domain: None,
            default_secure: false,
        }
    }
}

impl From<JarConfig> for CookieJar<'static> {
    fn from(config: JarConfig) -> Self {
        let JarConfig {
            default_path,
            default_domain,
            default_secure,
        } = config;
        CookieJar {
            cookies: HashMap::new(),
            default_path: Cow::Owned(default_path),
            default_domain: default_domain.map(Cow::Owned),
            default_secure,
        }
    }
}

impl<'c> CookieJar<'c> {
    /// Creates a new, empty [`CookieJar`] with no defaults other than the
    /// root path.
    pub fn new() -> CookieJar<'c> {
        Default::default()
    }

    /// Returns `true` if `self` holds a cookie identical to `cookie`, in every
    /// attribute.
    ///
    /// To look for cookies that share the identity of `cookie`, use
    /// [`CookieJar::get_matching_cookies`].
    pub fn has_cookie(&self, cookie: &Cookie<'c>) -> bool {
        self.cookies
            .get(&cookie.key())
            .is_some_and(|stored| stored == cookie)
    }

    /// Adds a cookie to the jar.
    ///
    /// 1. The jar defaults are applied: a cookie without a domain gets the
    ///    default domain, if there is one. A cookie that didn't set `Secure`
    ///    gets the default `Secure` value.
    /// 2. If the jar holds an identical cookie, nothing happens.
    /// 3. If the jar holds a cookie with the same identity, it is evicted when
    ///    the new cookie supersedes it: either their values differ, or the new
    ///    `Max-Age` is greater (a missing `Max-Age` counts as zero). Otherwise
    ///    the stored cookie is kept and the new one is discarded.
    /// 4. The new cookie is stored, unless it is a tombstone. Tombstones evict
    ///    their stored counterpart but never enter the jar themselves.
    ///
    /// The jar never holds two cookies with the same identity. A new cookie
    /// that doesn't supersede the stored one is dropped silently: check
    /// [`CookieJar::has_cookie`] afterwards if you need to know.
    pub fn add_cookie(&mut self, cookie: Cookie<'c>) {
        let cookie = self.apply_defaults(cookie);
        let key = cookie.key();

        if let Some(stored) = self.cookies.get(&key) {
            if stored == &cookie {
                return;
            }
            if !supersedes(&cookie, stored) {
                log::debug!(
                    "Keeping the queued `{}` cookie: the new one has the same value and a shorter lifetime",
                    stored.name()
                );
                return;
            }
            log::debug!(
                "Evicting the queued `{}` cookie, superseded by a new one",
                stored.name()
            );
            self.cookies.remove(&key);
        }

        if cookie.is_tombstone() {
            log::debug!(
                "Not queueing the `{}` cookie: it has no value",
                cookie.name()
            );
            return;
        }
        self.cookies.insert(key, cookie);
    }

    /// Builds a cookie out of `fields` and adds it to the jar, see
    /// [`CookieJar::add_cookie`].
    ///
    /// If `fields` has no path, the jar's default path is used.
    ///
    /// The jar is left untouched if `fields` fail validation.
    pub fn add_fields(&mut self, fields: CookieFields<'c>) -> Result<(), UnresolvableCookieError> {
        let fields = if fields.has_path() {
            fields
        } else {
            fields.set_path(self.default_path.clone())
        };
        let name = fields.name().to_string();
        let cookie = Cookie::from_fields(fields)
            .map_err(|source| UnresolvableCookieError { name, source })?;
        self.add_cookie(cookie);
        Ok(())
    }

    /// Removes the cookie that shares the identity of `cookie`, returning it.
    pub fn remove_cookie(&mut self, cookie: &Cookie<'c>) -> Option<Cookie<'c>> {
        self.cookies.remove(&cookie.key())
    }

    /// Returns a cookie whose name matches `name`, case-insensitively.
    ///
    /// If more than one cookie matches (e.g. same name, different paths),
    /// which one is returned is unspecified.
    pub fn get_cookie_by_name(&self, name: &str) -> Option<&Cookie<'c>> {
        self.cookies
            .values()
            .find(|cookie| cookie.name().eq_ignore_ascii_case(name))
    }

    /// Returns `true` if the jar is not empty.
    pub fn has_cookies(&self) -> bool {
        !self.cookies.is_empty()
    }

    /// Returns all the cookies in the jar, in no particular order.
    pub fn get_cookies(&self) -> Vec<&Cookie<'c>> {
        self.cookies.values().collect()
    }

    /// Returns the stored cookies that share the identity of `cookie`.
    pub fn get_matching_cookies(&self, cookie: &Cookie<'c>) -> Vec<&Cookie<'c>> {
        self.cookies.get(&cookie.key()).into_iter().collect()
    }

    /// Returns `true` if a cookie named `name` is queued, see
    /// [`CookieJar::get_cookie_by_name`].
    pub fn has_queued_cookie(&self, name: &str) -> bool {
        self.get_cookie_by_name(name).is_some()
    }

    /// Removes the cookie returned by [`CookieJar::get_cookie_by_name`], if
    /// any.
    pub fn unqueue_cookie(&mut self, name: &str) -> Option<Cookie<'c>> {
        let key = self.get_cookie_by_name(name)?.key();
        self.cookies.remove(&key)
    }

    /// Sets the defaults applied to the cookies added from now on.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::{CookieFields, CookieJar};
    ///
    /// let mut jar = CookieJar::new();
    /// jar.set_default_path_and_domain("/app", "example.com", true)
    ///     .add_fields(CookieFields::new("id").set_value("1"))
    ///     .unwrap();
    ///
    /// let cookie = jar.get_cookie_by_name("id").unwrap();
    /// assert_eq!(cookie.path(), "/app");
    /// assert_eq!(cookie.domain(), Some("example.com"));
    /// assert_eq!(cookie.secure(), Some(true));
    /// ```
    pub fn set_default_path_and_domain<P, D>(
        &mut self,
        path: P,
        domain: D,
        secure: bool,
    ) -> &mut Self
    where
        P: Into<Cow<'c, str>>,
        D: Into<Cow<'c, str>>,
    {
        self.default_path = path.into();
        self.default_domain = Some(domain.into());
        self.default_secure = secure;
        self
    }

    /// Removes all cookies.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }

    /// Returns the number of cookies in the jar.
    pub fn count(&self) -> usize {
        self.cookies.len()
    }

    /// Iterates over the cookies in the jar, in no particular order.
    pub fn iter(&self) -> Iter<'_, 'c> {
        Iter {
            cookies: self.cookies.values(),
        }
    }

    /// Returns the `Set-Cookie` header values for all the cookies in the jar.
    ///
    /// # Example
    ///
    /// ```rust
    /// use amaretti::{Cookie, CookieJar};
    ///
    /// let mut jar = CookieJar::new();
    /// jar.add_cookie(Cookie::new("name", "value").unwrap());
    /// let values: Vec<_> = jar.header_values().collect();
    /// assert_eq!(values, vec!["name=value; Path=/".to_string()]);
    /// ```
    pub fn header_values(&self) -> impl Iterator<Item = String> + '_ {
        self.cookies.values().map(util::to_string)
    }

    fn apply_defaults(&self, mut cookie: Cookie<'c>) -> Cookie<'c> {
        if cookie.domain().is_none() {
            if let Some(domain) = &self.default_domain {
                cookie = cookie.with_domain(domain.clone());
            }
        }
        if cookie.secure().is_none() {
            cookie = cookie.with_secure(self.default_secure);
        }
        cookie
    }
}

/// Whether `new` should replace `stored`, which shares its identity.
fn supersedes(new: &Cookie<'_>, stored: &Cookie<'_>) -> bool {
    let max_age = |cookie: &Cookie<'_>| cookie.max_age().unwrap_or(Duration::ZERO);
    new.value() != stored.value() || max_age(new) > max_age(stored)
}

impl<'map, 'c> IntoIterator for &'map CookieJar<'c> {
    type Item = &'map Cookie<'c>;
    type IntoIter = Iter<'map, 'c>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to build a valid cookie named {name:?} out of the provided fields")]
/// The error returned by [`CookieJar::add_fields`] when the fields don't make
/// up a valid cookie.
///
/// The underlying validation failure is available as the error source.
pub struct UnresolvableCookieError {
    name: String,
    #[source]
    source: CookieError,
}

impl UnresolvableCookieError {
    /// The name found in the rejected fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// What made the fields invalid.
    pub fn reason(&self) -> &CookieError {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use googletest::prelude::*;
    use time::Duration;

    use crate::config::JarConfig;
    use crate::{Cookie, CookieError, CookieFields, CookieJar};

    fn fields(name: &'static str, value: Option<&'static str>) -> CookieFields<'static> {
        let fields = CookieFields::new(name).set_domain("x.com").set_path("/");
        match value {
            Some(value) => fields.set_value(value),
            None => fields,
        }
    }

    #[test]
    fn newer_values_replace_older_ones() {
        let mut jar = CookieJar::new();
        jar.add_fields(fields("id", Some("1"))).unwrap();
        jar.add_fields(fields("id", Some("2"))).unwrap();

        assert_eq!(jar.count(), 1);
        assert_eq!(jar.get_cookie_by_name("id").unwrap().value(), Some("2"));
    }

    #[test]
    fn tombstones_evict_but_are_not_stored() {
        let mut jar = CookieJar::new();
        jar.add_fields(fields("id", Some("1"))).unwrap();
        jar.add_fields(fields("id", None)).unwrap();
        assert_eq!(jar.count(), 0);

        // No stored counterpart: nothing happens.
        jar.add_fields(fields("other", None)).unwrap();
        assert_eq!(jar.count(), 0);
        assert!(!jar.has_cookies());
    }

    #[test]
    fn longer_max_age_supersedes() {
        let mut jar = CookieJar::new();
        let short = fields("id", Some("1")).set_max_age(Duration::seconds(60));
        let long = fields("id", Some("1")).set_max_age(Duration::seconds(3600));

        jar.add_fields(short.clone()).unwrap();
        jar.add_fields(long.clone()).unwrap();
        assert_eq!(jar.count(), 1);
        let stored = jar.get_cookie_by_name("id").unwrap();
        assert_eq!(stored.max_age(), Some(Duration::seconds(3600)));

        // Same value, shorter lifetime: the stored cookie wins and the new
        // one is dropped.
        let dropped = Cookie::from_fields(short).unwrap().with_secure(false);
        jar.add_cookie(dropped.clone());
        assert_eq!(jar.count(), 1);
        assert!(!jar.has_cookie(&dropped));
        let stored = jar.get_cookie_by_name("id").unwrap();
        assert_eq!(stored.max_age(), Some(Duration::seconds(3600)));
    }

    #[test]
    fn identical_cookies_are_not_duplicated() {
        let mut jar = CookieJar::new();
        let cookie = Cookie::from_fields(fields("id", Some("1"))).unwrap();
        jar.add_cookie(cookie.clone());
        jar.add_cookie(cookie.clone());
        assert_eq!(jar.count(), 1);
        // The jar applied its default `Secure` value.
        assert!(!jar.has_cookie(&cookie));
        assert!(jar.has_cookie(&cookie.with_secure(false)));
    }

    #[test]
    fn different_paths_and_domains_coexist() {
        let mut jar = CookieJar::new();
        jar.add_fields(fields("id", Some("1"))).unwrap();
        jar.add_fields(fields("id", Some("1")).set_path("/admin")).unwrap();
        jar.add_fields(fields("id", Some("1")).set_domain("y.com")).unwrap();
        assert_eq!(jar.count(), 3);

        let probe = Cookie::from_fields(fields("ID", Some("other")).set_path("/admin/")).unwrap();
        let matching = jar.get_matching_cookies(&probe);
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].path(), "/admin");
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let mut jar = CookieJar::new();
        jar.add_cookie(Cookie::new("Session", "abc").unwrap());

        let cookie = jar.get_cookie_by_name("session").unwrap();
        assert_eq!(cookie.name(), "Session");
        assert!(jar.has_queued_cookie("SESSION"));
        assert!(!jar.has_queued_cookie("other"));
    }

    #[test]
    fn unqueue_and_remove() {
        let mut jar = CookieJar::new();
        jar.add_cookie(Cookie::new("a", "1").unwrap());
        jar.add_cookie(Cookie::new("b", "2").unwrap());

        assert_eq!(jar.unqueue_cookie("A").unwrap().value(), Some("1"));
        assert!(jar.unqueue_cookie("a").is_none());
        assert_eq!(jar.count(), 1);

        let removed = jar.remove_cookie(&Cookie::new("b", "anything").unwrap());
        assert_eq!(removed.unwrap().value(), Some("2"));
        assert!(!jar.has_cookies());
    }

    #[test]
    fn clear_empties_the_jar() {
        let mut jar = CookieJar::new();
        jar.add_cookie(Cookie::new("a", "1").unwrap());
        jar.add_cookie(Cookie::new("b", "2").unwrap());
        assert_eq!(jar.get_cookies().len(), 2);

        jar.clear();
        assert_eq!(jar.count(), 0);
        assert!(!jar.has_cookies());
        assert_eq!(jar.iter().count(), 0);
    }

    #[test]
    fn defaults_only_fill_in_missing_attributes() {
        let mut jar = CookieJar::new();
        jar.set_default_path_and_domain("/app/", ".Example.com", true);

        jar.add_fields(CookieFields::new("a").set_value("1")).unwrap();
        jar.add_fields(
            CookieFields::new("b")
                .set_value("2")
                .set_path("/other")
                .set_domain("other.com")
                .set_secure(false),
        )
        .unwrap();
        // Cookies built outside of the jar already have a path.
        jar.add_cookie(Cookie::new("c", "3").unwrap());

        let a = jar.get_cookie_by_name("a").unwrap();
        assert_eq!(a.path(), "/app");
        assert_eq!(a.domain(), Some("example.com"));
        assert_eq!(a.secure(), Some(true));

        let b = jar.get_cookie_by_name("b").unwrap();
        assert_eq!(b.path(), "/other");
        assert_eq!(b.domain(), Some("other.com"));
        assert_eq!(b.secure(), Some(false));

        let c = jar.get_cookie_by_name("c").unwrap();
        assert_eq!(c.path(), "/");
        assert_eq!(c.domain(), Some("example.com"));
        assert_eq!(c.secure(), Some(true));
    }

    #[test]
    fn jar_from_config() {
        let mut config = JarConfig::default();
        config.default_path = "/api".to_string();
        config.default_domain = Some("example.com".to_string());
        let mut jar: CookieJar = config.into();

        jar.add_fields(CookieFields::new("a").set_value("1")).unwrap();
        let a = jar.get_cookie_by_name("a").unwrap();
        assert_eq!(a.path(), "/api");
        assert_eq!(a.domain(), Some("example.com"));
        assert_eq!(a.secure(), Some(false));
    }

    #[test]
    fn invalid_fields_leave_the_jar_untouched() {
        let mut jar = CookieJar::new();
        jar.add_fields(fields("id", Some("1"))).unwrap();

        let err = jar
            .add_fields(fields("id", Some("evil\r\nSet-Cookie: admin=1")))
            .unwrap_err();
        assert_eq!(err.name(), "id");
        assert_that!(*err.reason(), matches_pattern!(CookieError::InvalidValue(anything())));
        assert!(err.source().is_some());
        assert_that!(
            err,
            displays_as(eq(
                "Failed to build a valid cookie named \"id\" out of the provided fields"
            ))
        );

        assert!(jar.add_fields(CookieFields::new("a b").set_value("1")).is_err());
        assert_eq!(jar.count(), 1);
        assert_eq!(jar.get_cookie_by_name("id").unwrap().value(), Some("1"));
    }

    #[test]
    fn header_values() {
        let mut jar = CookieJar::new();
        jar.add_fields(
            CookieFields::new("session")
                .set_value("abc")
                .set_domain("x.com")
                .set_secure(true)
                .set_http_only(true),
        )
        .unwrap();
        jar.add_cookie(Cookie::new("theme", "dark").unwrap());

        let mut values: Vec<_> = jar.header_values().collect();
        values.sort();
        assert_eq!(
            values,
            vec![
                "session=abc; Path=/; Domain=x.com; Secure; HttpOnly".to_string(),
                "theme=dark; Path=/".to_string(),
            ]
        );

        let names: Vec<_> = (&jar).into_iter().map(|c| c.name()).collect();
        assert_eq!(names.len(), 2);
    }
}
