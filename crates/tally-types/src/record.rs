use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// A finalized presence session.
///
/// `count` objects were present for `duration`, ending at `end_time`. Records are
/// only produced for sessions that lasted at least the configured minimum, and
/// `count` is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub count: u32,
    #[serde(rename = "duration_secs", with = "duration_secs")]
    pub duration: TimeDelta,
    pub end_time: DateTime<Utc>,
}

impl LogRecord {
    pub fn new(count: u32, duration: TimeDelta, end_time: DateTime<Utc>) -> Self {
        Self {
            count,
            duration,
            end_time,
        }
    }

    /// When the session this record closes began.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.end_time - self.duration
    }
}

/// TimeDelta <-> fractional seconds, millisecond precision.
mod duration_secs {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.num_milliseconds() as f64 / 1000.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom(format!(
                "duration must be a non-negative number of seconds, got {}",
                secs
            )));
        }
        Ok(TimeDelta::milliseconds((secs * 1000.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_time_is_end_minus_duration() {
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 12).unwrap();
        let record = LogRecord::new(3, TimeDelta::seconds(12), end);
        assert_eq!(
            record.start_time(),
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn serializes_duration_as_seconds() {
        let end = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 15).unwrap();
        let record = LogRecord::new(2, TimeDelta::milliseconds(15_500), end);

        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["count"], 2);
        assert_eq!(json["duration_secs"], 15.5);
        assert_eq!(json["end_time"], "2025-06-01T08:00:15Z");

        let back: LogRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn rejects_negative_duration() {
        let json = serde_json::json!({
            "count": 1,
            "duration_secs": -3.0,
            "end_time": "2025-06-01T08:00:15Z",
        });
        assert!(serde_json::from_value::<LogRecord>(json).is_err());
    }
}
