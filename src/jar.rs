//! Low-level types related to [`CookieJar`].
//!
//! [`CookieJar`]: crate::CookieJar
use std::collections::hash_map::Values;

use crate::{Cookie, CookieKey};

/// Iterator over all the cookies in a [`CookieJar`], in no particular order.
///
/// This struct is created by the [`CookieJar::iter()`] method.
///
/// [`CookieJar`]: crate::CookieJar
/// [`CookieJar::iter()`]: crate::CookieJar::iter
pub struct Iter<'map, 'cookie> {
    pub(crate) cookies: Values<'map, CookieKey<'cookie>, Cookie<'cookie>>,
}

impl<'map, 'cookie> Iterator for Iter<'map, 'cookie> {
    type Item = &'map Cookie<'cookie>;

    fn next(&mut self) -> Option<&'map Cookie<'cookie>> {
        self.cookies.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.cookies.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_, '_> {}

impl std::iter::FusedIterator for Iter<'_, '_> {}
