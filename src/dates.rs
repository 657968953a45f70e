use chrono::{
    DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

use crate::error::ErddapError;

/// A date accepted by [`parse_dates`]: free text or an already built value.
#[derive(Debug, Clone, PartialEq)]
pub enum DateInput {
    Text(String),
    Naive(NaiveDateTime),
    Zoned(DateTime<FixedOffset>),
}

impl From<&str> for DateInput {
    fn from(value: &str) -> Self {
        DateInput::Text(value.to_string())
    }
}

impl From<String> for DateInput {
    fn from(value: String) -> Self {
        DateInput::Text(value)
    }
}

impl From<NaiveDateTime> for DateInput {
    fn from(value: NaiveDateTime) -> Self {
        DateInput::Naive(value)
    }
}

impl From<NaiveDate> for DateInput {
    fn from(value: NaiveDate) -> Self {
        DateInput::Naive(value.and_time(NaiveTime::MIN))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for DateInput {
    fn from(value: DateTime<Tz>) -> Self {
        DateInput::Zoned(value.fixed_offset())
    }
}

const ZONED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %:z",
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M%:z",
];

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d %b %Y %H:%M:%S%.f",
    "%d %B %Y %H:%M:%S%.f",
    "%b %d %Y %H:%M:%S%.f",
    "%B %d, %Y %H:%M:%S%.f",
    "%m/%d/%y %H:%M:%S%.f",
    "%m/%d/%y %H:%M",
];

/// Date-and-hour forms; parsed with `:00` minutes appended.
const HOUR_ONLY_FORMATS: &[&str] = &["%Y-%m-%dT%H", "%Y-%m-%d %H"];

/// Month-and-year forms; parsed as the first day of that month.
const MONTH_YEAR_FORMATS: &[&str] = &["%b %Y", "%B %Y", "%b, %Y", "%B, %Y"];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
];

/// Two-digit years: 00-69 land in 2000-2069, 70-99 in 1970-1999.
const SHORT_YEAR_FORMATS: &[&str] = &[
    "%m/%d/%y",
    "%d %b %y",
    "%d %B %y",
    "%b %d %y",
    "%b %d, %y",
    "%B %d %y",
    "%B %d, %y",
];

/// Convert a date to seconds since 1970-01-01T00:00:00Z.
///
/// Naive values are taken to be UTC already; zoned values are shifted to
/// UTC. Sub-second precision is kept.
pub fn parse_dates(value: impl Into<DateInput>) -> Result<f64, ErddapError> {
    let utc = match value.into() {
        DateInput::Text(text) => parse_text(&text)?,
        DateInput::Naive(naive) => naive.and_utc(),
        DateInput::Zoned(zoned) => zoned.with_timezone(&Utc),
    };
    Ok(epoch_seconds(&utc))
}

fn epoch_seconds(value: &DateTime<Utc>) -> f64 {
    value.timestamp() as f64 + f64::from(value.timestamp_subsec_nanos()) / 1e9
}

/// Best-effort parse of free-form date text into a UTC instant.
pub fn parse_text(text: &str) -> Result<DateTime<Utc>, ErddapError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ErddapError::DateParse(text.to_string()));
    }

    if let Ok(zoned) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(zoned.with_timezone(&Utc));
    }
    if let Ok(zoned) = DateTime::parse_from_rfc2822(trimmed) {
        return Ok(zoned.with_timezone(&Utc));
    }

    let zoned_text = normalize_utc_designator(trimmed);
    for format in ZONED_FORMATS {
        if let Ok(zoned) = DateTime::parse_from_str(&zoned_text, format) {
            if explicit_year(format, &zoned_text, zoned.year()) {
                return Ok(zoned.with_timezone(&Utc));
            }
        }
    }

    parse_naive(&zoned_text)
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ErddapError::DateParse(text.to_string()))
}

/// Rewrite a trailing `Z`, `UTC` or `GMT` into an explicit `+00:00` offset.
fn normalize_utc_designator(text: &str) -> String {
    for suffix in [" UTC", "UTC", " GMT", "GMT", "Z", "z"] {
        if let Some(stripped) = text.strip_suffix(suffix) {
            let has_time = stripped.contains(':');
            if has_time {
                return format!("{}+00:00", stripped.trim_end());
            }
            return stripped.trim_end().to_string();
        }
    }
    text.to_string()
}

/// `%Y` accepts any number of digits, so `Jan 2018` would otherwise read as
/// day 20 of year 18. A `%Y` match only counts when the text spells the year
/// with four digits.
fn explicit_year(format: &str, text: &str, year: i32) -> bool {
    if !format.contains("%Y") {
        return true;
    }
    let padded = format!("{year:04}");
    text.split(|ch: char| !ch.is_ascii_digit()).any(|run| run == padded)
}

fn parse_naive(text: &str) -> Option<NaiveDateTime> {
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            if explicit_year(format, text, naive.year()) {
                return Some(naive);
            }
        }
    }
    for format in HOUR_ONLY_FORMATS {
        let padded = format!("{text}:00");
        if let Ok(naive) = NaiveDateTime::parse_from_str(&padded, &format!("{format}:%M")) {
            if explicit_year(format, text, naive.year()) {
                return Some(naive);
            }
        }
    }
    parse_date(text).map(|date| date.and_time(NaiveTime::MIN))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let all_digits = text.chars().all(|ch| ch.is_ascii_digit());
    match text.len() {
        4 if all_digits => return NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1),
        8 if all_digits => {
            let year = text[..4].parse().ok()?;
            let month = text[4..6].parse().ok()?;
            let day = text[6..].parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        7 if text.as_bytes()[4] == b'-' => {
            return NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok();
        }
        _ => {}
    }

    let first_of_month = format!("1 {text}");
    let month_year = MONTH_YEAR_FORMATS.iter().find_map(|format| {
        NaiveDate::parse_from_str(&first_of_month, &format!("%d {format}"))
            .ok()
            .filter(|date| explicit_year(format, text, date.year()))
    });
    if month_year.is_some() {
        return month_year;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .filter(|date| explicit_year(format, text, date.year()))
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        })
}
