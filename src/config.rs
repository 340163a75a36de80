//! Configuration for a [`CookieJar`].
//!
//! Check out the [`JarConfig`] struct for more information.
//!
//! [`CookieJar`]: crate::CookieJar

/// `JarConfig` specifies the defaults a [`CookieJar`] applies to the cookies
/// it receives.
///
/// # [`CookieJar`]
///
/// To action these defaults, convert the configuration into a [`CookieJar`]:
///
/// ```rust
/// use amaretti::CookieJar;
/// use amaretti::config::JarConfig;
///
/// let mut config = JarConfig::default();
/// config.default_domain = Some("example.com".to_string());
/// config.default_secure = true;
/// let jar: CookieJar = config.into();
/// ```
///
/// With the `serde` feature enabled, `JarConfig` can be deserialized.
/// Missing fields take their default value.
///
/// [`CookieJar`]: crate::CookieJar
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct JarConfig {
    /// The path given to cookies built from fields without a path.
    ///
    /// By default, this field is `/`.
    pub default_path: String,
    /// The domain given to cookies without a domain.
    ///
    /// By default, this field is `None`: cookies without a domain are sent
    /// without one.
    pub default_domain: Option<String>,
    /// Whether cookies that don't say otherwise are marked `Secure`.
    ///
    /// By default, this field is `false`.
    pub default_secure: bool,
}

impl Default for JarConfig {
    fn default() -> Self {
        JarConfig {
            default_path: "/".to_string(),
            default_domain: None,
            default_secure: false,
        }
    }
}
