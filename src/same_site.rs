use std::fmt;
use std::str::FromStr;

/// The `SameSite` cookie attribute.
///
/// It restricts when the cookie is sent along with cross-site requests:
///
/// - `Strict`: never sent in cross-site requests.
/// - `Lax`: only sent in cross-site requests using "safe" HTTP methods
///   (`GET`, `HEAD`, `OPTIONS`, `TRACE`).
/// - `None`: sent in all cross-site requests. Browsers ignore it unless the
///   cookie is also marked `Secure`.
///
/// A cookie with no `SameSite` attribute is sent following the browser's
/// default policy.
///
/// ```rust
/// use amaretti::SameSite;
///
/// let same_site: SameSite = "lax".parse().unwrap();
/// assert_eq!(same_site, SameSite::Lax);
/// assert_eq!(same_site.to_string(), "Lax");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum SameSite {
    /// The "Strict" `SameSite` attribute.
    #[cfg_attr(feature = "serde", serde(alias = "strict"))]
    Strict,
    /// The "Lax" `SameSite` attribute.
    #[cfg_attr(feature = "serde", serde(alias = "lax"))]
    Lax,
    /// The "None" `SameSite` attribute.
    #[cfg_attr(feature = "serde", serde(alias = "none"))]
    None,
}

impl SameSite {
    /// Returns the attribute value as it appears in a `Set-Cookie` header.
    pub fn as_str(&self) -> &'static str {
        match *self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = ParseSameSiteError;

    /// Parsing is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("strict") {
            Ok(SameSite::Strict)
        } else if s.eq_ignore_ascii_case("lax") {
            Ok(SameSite::Lax)
        } else if s.eq_ignore_ascii_case("none") {
            Ok(SameSite::None)
        } else {
            Err(ParseSameSiteError {
                raw: s.to_string(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("`{raw}` is not a valid `SameSite` value. Expected one of `Strict`, `Lax` or `None`")]
/// The error returned when parsing a [`SameSite`] from a string fails.
pub struct ParseSameSiteError {
    raw: String,
}

#[cfg(test)]
mod tests {
    use super::SameSite;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!("none".parse::<SameSite>().unwrap(), SameSite::None);
    }

    #[test]
    fn unknown_values_are_rejected() {
        let err = "sometimes".parse::<SameSite>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "`sometimes` is not a valid `SameSite` value. Expected one of `Strict`, `Lax` or `None`"
        );
    }
}
