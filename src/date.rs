//! Parsing and formatting of the dates found in cookie `Expires` attributes.
//!
//! Browsers and servers have historically emitted a wide range of date
//! encodings. [`parse_date`] accepts the most common ones and falls back to a
//! handful of general-purpose parsers for everything else.
use std::fmt;

use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use self::Component::*;

/// A single element of a date format descriptor.
#[derive(Debug, Clone, Copy)]
enum Component {
    /// Three-letter weekday abbreviation. It is validated, but never
    /// cross-checked against the date.
    Weekday,
    /// Day of the month, one or two digits.
    Day,
    /// Three-letter month abbreviation.
    MonthName,
    /// Month number, one or two digits.
    MonthNumber,
    /// Two-digit year: `00-69` maps to `2000-2069`, `70-99` to `1970-1999`.
    ShortYear,
    /// Four-digit year.
    Year,
    /// Hour, one or two digits.
    Hour,
    /// Hour, exactly two digits.
    PaddedHour,
    Minute,
    Second,
    /// Zone abbreviation or numeric offset.
    Zone,
    Literal(&'static str),
}

/// The date encodings we recognise, in the order they are tried.
///
/// RFC 2616 section 3.3.1 plus a few non-standard but common variants.
#[rustfmt::skip]
const DATE_FORMATS: [&[Component]; 8] = [
    // Wkd, DD Mon YY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal(" "), MonthName, Literal(" "), ShortYear,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd, DD Mon YYYY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal(" "), MonthName, Literal(" "), Year,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd, DD-Mon-YY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal("-"), MonthName, Literal("-"), ShortYear,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd, DD-Mon-YYYY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal("-"), MonthName, Literal("-"), Year,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd, DD-mm-YY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal("-"), MonthNumber, Literal("-"), ShortYear,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd, DD-mm-YYYY HH:MM:SS TZ
    &[
        Weekday, Literal(", "), Day, Literal("-"), MonthNumber, Literal("-"), Year,
        Literal(" "), PaddedHour, Literal(":"), Minute, Literal(":"), Second, Literal(" "), Zone,
    ],
    // Wkd Mon D H:MM:SS YYYY
    &[
        Weekday, Literal(" "), MonthName, Literal(" "), Day, Literal(" "), Hour,
        Literal(":"), Minute, Literal(":"), Second, Literal(" "), Year,
    ],
    // Wkd Mon DD HH:MM:SS YYYY TZ
    &[
        Weekday, Literal(" "), MonthName, Literal(" "), Day, Literal(" "), PaddedHour,
        Literal(":"), Minute, Literal(":"), Second, Literal(" "), Year, Literal(" "), Zone,
    ],
];

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Parse a cookie date.
///
/// The known cookie date encodings are tried first, in a fixed order:
///
/// 1. `Wkd, DD Mon YY HH:MM:SS TZ`
/// 2. `Wkd, DD Mon YYYY HH:MM:SS TZ`
/// 3. `Wkd, DD-Mon-YY HH:MM:SS TZ`
/// 4. `Wkd, DD-Mon-YYYY HH:MM:SS TZ`
/// 5. `Wkd, DD-mm-YY HH:MM:SS TZ`
/// 6. `Wkd, DD-mm-YYYY HH:MM:SS TZ`
/// 7. `Wkd Mon D H:MM:SS YYYY`
/// 8. `Wkd Mon DD HH:MM:SS YYYY TZ`
///
/// If none of them matches, the input goes through RFC 2822, RFC 3339,
/// the HTTP date parser (IMF-fixdate, RFC 850, asctime) and a bare
/// `YYYY-MM-DD HH:MM:SS`.
///
/// Dates without an explicit zone are interpreted as GMT.
/// The returned date-time is always in UTC.
///
/// # Example
///
/// ```rust
/// use amaretti::util::parse_date;
///
/// let date = parse_date("Sun, 06-Nov-1994 08:49:37 GMT").unwrap();
/// assert_eq!(date.unix_timestamp(), 784111777);
///
/// let date = parse_date("Sun Nov 6 8:49:37 1994").unwrap();
/// assert_eq!(date.unix_timestamp(), 784111777);
///
/// assert!(parse_date("the day after tomorrow").is_err());
/// ```
pub fn parse_date(text: &str) -> Result<OffsetDateTime, UnparseableDateError> {
    let trimmed = text.trim();
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|components| apply_format(components, trimmed))
    {
        return Ok(date);
    }

    log::trace!("`{trimmed}` matches no cookie date format, trying free-form parsers");
    parse_free_form(trimmed).ok_or_else(|| UnparseableDateError {
        raw: text.to_string(),
    })
}

/// Format a date-time the way it appears in a `Set-Cookie` header:
/// `Wkd, DD-Mon-YYYY HH:MM:SS GMT`.
///
/// ```rust
/// use amaretti::util::format_date;
/// use amaretti::time::OffsetDateTime;
///
/// let date = OffsetDateTime::from_unix_timestamp(1445412480).unwrap();
/// assert_eq!(format_date(date), "Wed, 21-Oct-2015 07:28:00 GMT");
/// ```
pub fn format_date(datetime: OffsetDateTime) -> String {
    CookieDate(datetime).to_string()
}

/// A [`Display`](fmt::Display) adapter for [`format_date`].
pub(crate) struct CookieDate(pub(crate) OffsetDateTime);

impl fmt::Display for CookieDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        static FMT: &[FormatItem<'_>] = format_description!(
            "[weekday repr:short], [day]-[month repr:short]-[year] [hour]:[minute]:[second] GMT"
        );
        // Shifting to UTC can leave the supported range: clamp to its bounds.
        let utc = self.0.checked_to_offset(UtcOffset::UTC).unwrap_or_else(|| {
            if self.0.offset().is_negative() {
                PrimitiveDateTime::MAX.assume_utc()
            } else {
                PrimitiveDateTime::MIN.assume_utc()
            }
        });
        f.write_str(&utc.format(&FMT).map_err(|_| fmt::Error)?)
    }
}

#[derive(Default)]
struct Parts {
    day: Option<u8>,
    month: Option<u8>,
    year: Option<i32>,
    hour: u8,
    minute: u8,
    second: u8,
    offset: Option<UtcOffset>,
}

fn apply_format(components: &[Component], input: &str) -> Option<OffsetDateTime> {
    let mut parts = Parts::default();
    let mut rest = input;
    for component in components {
        rest = match *component {
            Literal(literal) => rest.strip_prefix(literal)?,
            Weekday => {
                let (name, rest) = split_alphabetic(rest);
                if !WEEKDAYS.iter().any(|w| w.eq_ignore_ascii_case(name)) {
                    return None;
                }
                rest
            }
            Day => {
                let (day, rest) = digits(rest, 1, 2)?;
                parts.day = Some(day as u8);
                rest
            }
            MonthName => {
                let (name, rest) = split_alphabetic(rest);
                let index = MONTHS.iter().position(|m| m.eq_ignore_ascii_case(name))?;
                parts.month = Some(index as u8 + 1);
                rest
            }
            MonthNumber => {
                let (month, rest) = digits(rest, 1, 2)?;
                parts.month = Some(month as u8);
                rest
            }
            ShortYear => {
                let (year, rest) = digits(rest, 2, 2)?;
                let year = year as i32;
                parts.year = Some(if year < 70 { 2000 + year } else { 1900 + year });
                rest
            }
            Year => {
                let (year, rest) = digits(rest, 4, 4)?;
                parts.year = Some(year as i32);
                rest
            }
            Hour => {
                let (hour, rest) = digits(rest, 1, 2)?;
                parts.hour = hour as u8;
                rest
            }
            PaddedHour => {
                let (hour, rest) = digits(rest, 2, 2)?;
                parts.hour = hour as u8;
                rest
            }
            Minute => {
                let (minute, rest) = digits(rest, 2, 2)?;
                parts.minute = minute as u8;
                rest
            }
            Second => {
                let (second, rest) = digits(rest, 2, 2)?;
                parts.second = second as u8;
                rest
            }
            Zone => {
                let (offset, rest) = zone(rest)?;
                parts.offset = Some(offset);
                rest
            }
        };
    }
    if !rest.is_empty() {
        return None;
    }

    let month = Month::try_from(parts.month?).ok()?;
    let date = Date::from_calendar_date(parts.year?, month, parts.day?).ok()?;
    let time = Time::from_hms(parts.hour, parts.minute, parts.second).ok()?;
    let offset = parts.offset.unwrap_or(UtcOffset::UTC);
    PrimitiveDateTime::new(date, time)
        .assume_offset(offset)
        .checked_to_offset(UtcOffset::UTC)
}

/// Splits off the leading run of ASCII letters.
fn split_alphabetic(input: &str) -> (&str, &str) {
    let end = input
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(input.len());
    input.split_at(end)
}

/// Reads between `min` and `max` leading ASCII digits.
fn digits(input: &str, min: usize, max: usize) -> Option<(u32, &str)> {
    let available = input.bytes().take_while(u8::is_ascii_digit).count();
    if available < min {
        return None;
    }
    let (number, rest) = input.split_at(available.min(max));
    Some((number.parse().ok()?, rest))
}

fn zone(input: &str) -> Option<(UtcOffset, &str)> {
    if let Some(sign @ ('+' | '-')) = input.chars().next() {
        let (hours, rest) = digits(&input[1..], 2, 2)?;
        let rest = rest.strip_prefix(':').unwrap_or(rest);
        let (minutes, rest) = digits(rest, 2, 2)?;
        let (hours, minutes) = (hours as i8, minutes as i8);
        let offset = if sign == '-' {
            UtcOffset::from_hms(-hours, -minutes, 0)
        } else {
            UtcOffset::from_hms(hours, minutes, 0)
        };
        return Some((offset.ok()?, rest));
    }

    let (name, rest) = split_alphabetic(input);
    let hours = match name.to_ascii_uppercase().as_str() {
        "GMT" | "UTC" | "UT" | "Z" => 0,
        "EDT" => -4,
        "EST" | "CDT" => -5,
        "CST" | "MDT" => -6,
        "MST" | "PDT" => -7,
        "PST" => -8,
        _ => return None,
    };
    Some((UtcOffset::from_hms(hours, 0, 0).ok()?, rest))
}

fn parse_free_form(text: &str) -> Option<OffsetDateTime> {
    static SPACE_SEPARATED: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    static T_SEPARATED: &[FormatItem<'_>] =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

    OffsetDateTime::parse(text, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(text, &Rfc3339))
        .ok()
        .or_else(|| httpdate::parse_http_date(text).ok().map(OffsetDateTime::from))
        .or_else(|| {
            PrimitiveDateTime::parse(text, &SPACE_SEPARATED)
                .or_else(|_| PrimitiveDateTime::parse(text, &T_SEPARATED))
                .ok()
                .map(PrimitiveDateTime::assume_utc)
        })
        .and_then(|date| date.checked_to_offset(UtcOffset::UTC))
}

#[derive(Debug, thiserror::Error)]
#[error("Unparseable cookie date string `{raw}`")]
/// The error returned by [`parse_date`] when the input matches none of the
/// supported date encodings.
pub struct UnparseableDateError {
    raw: String,
}

impl UnparseableDateError {
    /// The input that could not be parsed.
    pub fn raw(&self) -> &str {
        &self.raw
    }
}
