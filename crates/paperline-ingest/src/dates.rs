use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{IngestError, Result};

const ZONE_TOKEN: &str = "%Z";

/// Parses timestamps ending in a named time zone (`Mon, 2 Apr 2007 19:18:42 GMT`).
///
/// The zone name is looked up in the IANA database shipped with `chrono-tz`.
/// Local times that occur twice in that zone resolve to the earlier instant;
/// local times skipped by a DST gap are rejected.
#[derive(Debug, Clone)]
pub struct DateExtractor {
    datetime_format: String,
}

impl DateExtractor {
    /// `format` must end with the `%Z` zone placeholder.
    pub fn new(format: &str) -> Result<Self> {
        let datetime_format = format
            .trim_end()
            .strip_suffix(ZONE_TOKEN)
            .map(|prefix| prefix.trim_end().to_string())
            .ok_or_else(|| IngestError::DateParse {
                input: format.to_string(),
                reason: "format does not end with a %Z zone token".to_string(),
            })?;

        Ok(Self { datetime_format })
    }

    pub fn parse(&self, input: &str) -> Result<DateTime<Utc>> {
        let trimmed = input.trim();
        let (datetime_part, zone) = trimmed
            .rsplit_once(char::is_whitespace)
            .map(|(dt, zone)| (dt.trim_end(), zone))
            .ok_or_else(|| date_error(input, "missing time zone"))?;

        if zone.starts_with('+') || zone.starts_with('-') {
            return parse_numeric_offset(input, datetime_part, zone, &self.datetime_format);
        }

        let naive = NaiveDateTime::parse_from_str(datetime_part, &self.datetime_format)
            .map_err(|e| date_error(input, e))?;

        let tz: Tz = zone
            .parse()
            .map_err(|_| date_error(input, format!("unknown time zone {zone}")))?;

        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, latest) => {
                Ok(earliest.min(latest).with_timezone(&Utc))
            }
            LocalResult::None => Err(date_error(
                input,
                format!("local time does not exist in {zone}"),
            )),
        }
    }
}

fn parse_numeric_offset(
    input: &str,
    datetime_part: &str,
    offset: &str,
    datetime_format: &str,
) -> Result<DateTime<Utc>> {
    DateTime::parse_from_str(
        &format!("{datetime_part} {offset}"),
        &format!("{datetime_format} %z"),
    )
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| date_error(input, e))
}

/// Parses an ISO-8601 / RFC 3339 timestamp, accepting a literal `Z` suffix.
pub fn parse_iso8601(input: &str) -> Result<DateTime<Utc>> {
    let trimmed = input.trim();
    let normalized = match trimmed.strip_suffix('Z') {
        Some(prefix) => format!("{prefix}+00:00"),
        None => trimmed.to_string(),
    };

    DateTime::parse_from_rfc3339(&normalized)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| date_error(input, e))
}

fn date_error(input: &str, reason: impl ToString) -> IngestError {
    IngestError::DateParse {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
