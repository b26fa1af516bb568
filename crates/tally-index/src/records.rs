use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tally_types::{LogRecord, StreamId};

/// A finalized session as persisted in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Row id, assigned on insert.
    pub id: i64,
    /// Detector stream the session was observed on.
    pub stream_id: StreamId,
    #[serde(flatten)]
    pub record: LogRecord,
    /// When the sink wrote the record (wall clock, not sample time).
    pub recorded_at: DateTime<Utc>,
}

/// Totals for one day and for all time.
///
/// "Objects" sums the session counts; "records" counts the sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionStats {
    pub date: NaiveDate,
    pub today_objects: u64,
    pub total_objects: u64,
    pub today_records: u64,
    pub total_records: u64,
}
