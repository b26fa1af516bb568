//! Detector log fixtures.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::fmt::Write as _;

/// Builder for a `time,count` CSV with one sample per step.
///
/// ```
/// use tally_testing::CountLog;
///
/// let csv = CountLog::starting_at_epoch(1_748_764_800)
///     .run(3, 20)
///     .run(0, 6)
///     .to_csv();
/// assert!(csv.starts_with("time,count\n2025-06-01T08:00:00Z,3\n"));
/// ```
#[derive(Debug, Clone)]
pub struct CountLog {
    start: DateTime<Utc>,
    step: TimeDelta,
    counts: Vec<i64>,
}

impl CountLog {
    pub fn starting_at(start: DateTime<Utc>) -> Self {
        Self {
            start,
            step: TimeDelta::seconds(1),
            counts: Vec::new(),
        }
    }

    /// Start at a Unix timestamp (seconds).
    pub fn starting_at_epoch(secs: i64) -> Self {
        let start = Utc
            .timestamp_opt(secs, 0)
            .single()
            .expect("timestamp out of range");
        Self::starting_at(start)
    }

    pub fn with_step(mut self, step: TimeDelta) -> Self {
        self.step = step;
        self
    }

    /// Append `len` samples that all report `count`.
    pub fn run(mut self, count: i64, len: usize) -> Self {
        self.counts.extend(std::iter::repeat_n(count, len));
        self
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn time_of(&self, index: usize) -> DateTime<Utc> {
        self.start + self.step * index as i32
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from("time,count\n");
        for (i, count) in self.counts.iter().enumerate() {
            let time = self.time_of(i).to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true);
            let _ = writeln!(out, "{},{}", time, count);
        }
        out
    }
}

/// Three birds for 40s, two leave, the last one stays another half minute.
///
/// Aggregates to `{3, 40s}` ending at +40s and `{1, 24s}` ending at +69s.
pub fn flock_visit() -> CountLog {
    CountLog::starting_at_epoch(1_748_764_800)
        .run(3, 40)
        .run(1, 30)
        .run(0, 10)
}

/// A bird that lands for a few seconds only; too short to be logged.
pub fn brief_visit() -> CountLog {
    CountLog::starting_at_epoch(1_748_764_800)
        .run(1, 4)
        .run(0, 8)
}
