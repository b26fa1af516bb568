use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One detector reading: how many objects were visible at `time`.
///
/// Samples are transient. They are handed to the aggregator one at a time, in
/// non-decreasing time order, and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub count: u32,
}

impl Sample {
    pub fn new(time: DateTime<Utc>, count: u32) -> Self {
        Self { time, count }
    }

    /// Build a sample from an untrusted detector count.
    ///
    /// Detector pipelines report counts as signed integers; a negative value is a
    /// caller bug and is rejected here so it never reaches the state machine.
    pub fn from_raw(time: DateTime<Utc>, count: i64) -> Result<Self> {
        let count = u32::try_from(count).map_err(|_| {
            Error::InvalidInput(format!("object count out of range: {}", count))
        })?;
        Ok(Self { time, count })
    }

    /// True when at least one object was detected.
    pub fn is_detection(&self) -> bool {
        self.count > 0
    }
}
