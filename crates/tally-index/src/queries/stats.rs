use chrono::NaiveDate;
use rusqlite::{params, Connection};
use tally_types::StreamId;

use super::format_date;
use crate::{DetectionStats, Result};

pub fn for_date(
    conn: &Connection,
    date: NaiveDate,
    stream_id: Option<&StreamId>,
) -> Result<DetectionStats> {
    let (today_objects, today_records, total_objects, total_records): (i64, i64, i64, i64) = conn
        .query_row(
            r#"
            SELECT
                COALESCE(SUM(CASE WHEN end_date = ?1 THEN object_count ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN end_date = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(object_count), 0),
                COUNT(*)
            FROM log_records
            WHERE (?2 IS NULL OR stream_id = ?2)
            "#,
            params![format_date(&date), stream_id.map(StreamId::as_str)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

    Ok(DetectionStats {
        date,
        today_objects: today_objects.max(0) as u64,
        total_objects: total_objects.max(0) as u64,
        today_records: today_records.max(0) as u64,
        total_records: total_records.max(0) as u64,
    })
}
