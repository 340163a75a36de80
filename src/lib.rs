//! A crate to manage the HTTP cookies a server sends to its clients.
//!
//! # Overview
//!
//! You can use `amaretti` to build, validate and queue the cookies that end
//! up in `Set-Cookie` response headers.
//!
//! It has support for:
//!
//! - Building validated, normalized cookies, via [`Cookie`] and [`CookieFields`]
//! - Queueing cookies for a response, via [`CookieJar`]
//! - Parsing the many date formats found in the wild, via [`util::parse_date`]
//!
//! In particular:
//!
//! - Invalid names and values (including header injection attempts) are rejected at construction
//! - Cookies are identified by name (case-insensitively), domain and path, see [`CookieKey`]
//! - Newer cookies replace older ones with the same identity
//! - A cookie without a value is a tombstone: it deletes its client-side counterpart
//!
//! # Non-goals
//!
//! `amaretti` doesn't parse incoming `Cookie` headers, nor does it encrypt or sign cookies.
//!
//! # Quickstart
//!
//! ```rust
//! use std::collections::HashSet;
//! use amaretti::{CookieFields, CookieJar, SameSite};
//! use amaretti::config::JarConfig;
//!
//! // Start by creating a jar, optionally from a configuration.
//! let mut config = JarConfig::default();
//! config.default_domain = Some("example.com".to_string());
//! let mut jar: CookieJar = config.into();
//!
//! // Queue the cookies you want to send.
//! jar.add_fields(
//!     CookieFields::new("session")
//!         .set_value("a1b2c3")
//!         .set_http_only(true)
//!         .set_same_site(SameSite::Lax),
//! ).unwrap();
//! // A cookie without a value asks the client to delete it.
//! jar.add_fields(CookieFields::new("tracking")).unwrap();
//!
//! // Tombstones only evict queued cookies, they are never queued themselves.
//! assert_eq!(jar.count(), 1);
//!
//! let header_values: HashSet<_> = jar.header_values().collect();
//! assert_eq!(header_values, HashSet::from([
//!     "session=a1b2c3; Path=/; Domain=example.com; HttpOnly; SameSite=Lax".to_string(),
//! ]));
//! ```
//!
//! # Logging
//!
//! `amaretti` emits diagnostics through the [`log`](https://crates.io/crates/log) facade.
//! Conflict resolution in [`CookieJar`] is reported at `debug` level, date parsing fallbacks at
//! `trace` level.

pub mod config;
mod cookie;
mod cookie_fields;
mod cookie_jar;
mod cookie_key;
mod date;
mod encoding;
pub mod jar;
mod same_site;
pub mod util;

pub use cookie::{Cookie, CookieError};
pub use cookie_fields::CookieFields;
pub use cookie_jar::CookieJar;
pub use cookie_key::CookieKey;
pub use same_site::SameSite;
pub use time;

/// Errors that can occur when using `amaretti`.
pub mod errors {
    pub use crate::cookie::CookieError;
    pub use crate::cookie_jar::UnresolvableCookieError;
    pub use crate::date::UnparseableDateError;
    pub use crate::same_site::ParseSameSiteError;
    pub use crate::util::{InvalidMaxAgeError, InvalidNameError, InvalidValueError};
}
