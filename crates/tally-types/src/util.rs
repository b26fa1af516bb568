use chrono::{DateTime, TimeDelta, Utc};

use crate::{Error, Result};

/// Render a duration the way people read session lengths: `45s`, `3m 05s`, `1h 02m 05s`.
pub fn format_duration(duration: TimeDelta) -> String {
    let total = duration.num_seconds().max(0);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;

    if hours > 0 {
        format!("{}h {:02}m {:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Parse a timestamp given either as RFC 3339 or as (fractional) Unix seconds.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(secs) = raw.parse::<f64>()
        && secs.is_finite()
    {
        let millis = (secs * 1000.0).round() as i64;
        if let Some(dt) = DateTime::from_timestamp_millis(millis) {
            return Ok(dt);
        }
    }

    Err(Error::InvalidInput(format!("unrecognised timestamp: {:?}", raw)))
}
