pub mod record;
pub mod stats;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

// Timestamps are stored as RFC 3339 UTC with millisecond precision and a `Z`
// suffix, so text order equals time order.

pub(crate) fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub(crate) fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Query(format!("corrupt timestamp {:?}: {}", raw, e)))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| Error::Query(format!("corrupt date {:?}: {}", raw, e)))
}
