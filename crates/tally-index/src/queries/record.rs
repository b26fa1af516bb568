use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use rusqlite::{params, Connection, Row};
use tally_types::{LogRecord, StreamId};

use super::{format_date, format_time, parse_date, parse_time};
use crate::{Error, Result, StoredRecord};

pub fn insert(
    conn: &Connection,
    stream_id: &StreamId,
    record: &LogRecord,
    recorded_at: DateTime<Utc>,
) -> Result<i64> {
    if record.count == 0 {
        return Err(Error::Query(
            "refusing to store a record with zero objects".to_string(),
        ));
    }

    conn.execute(
        r#"
        INSERT INTO log_records
            (stream_id, object_count, duration_ms, end_time, end_date, recorded_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            stream_id.as_str(),
            record.count,
            record.duration.num_milliseconds(),
            format_time(&record.end_time),
            format_date(&record.end_time.date_naive()),
            format_time(&recorded_at),
        ],
    )?;

    Ok(conn.last_insert_rowid())
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<StoredRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, stream_id, object_count, duration_ms, end_time, recorded_at
        FROM log_records
        WHERE id = ?1
        "#,
    )?;

    let mut rows = stmt.query([id])?;
    match rows.next()? {
        Some(row) => Ok(Some(from_row(row)?)),
        None => Ok(None),
    }
}

/// Most recent records first.
pub fn list(
    conn: &Connection,
    stream_id: Option<&StreamId>,
    limit: usize,
) -> Result<Vec<StoredRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, stream_id, object_count, duration_ms, end_time, recorded_at
        FROM log_records
        WHERE (?1 IS NULL OR stream_id = ?1)
        ORDER BY end_time DESC, id DESC
        LIMIT ?2
        "#,
    )?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut rows = stmt.query(params![stream_id.map(StreamId::as_str), limit])?;
    collect(&mut rows)
}

/// Records whose session ended on `date` (UTC), in chronological order.
pub fn on_date(
    conn: &Connection,
    date: NaiveDate,
    stream_id: Option<&StreamId>,
) -> Result<Vec<StoredRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, stream_id, object_count, duration_ms, end_time, recorded_at
        FROM log_records
        WHERE end_date = ?1 AND (?2 IS NULL OR stream_id = ?2)
        ORDER BY end_time ASC, id ASC
        "#,
    )?;

    let mut rows = stmt.query(params![format_date(&date), stream_id.map(StreamId::as_str)])?;
    collect(&mut rows)
}

/// Distinct days with at least one record, newest first.
pub fn dates(conn: &Connection, stream_id: Option<&StreamId>) -> Result<Vec<NaiveDate>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT DISTINCT end_date
        FROM log_records
        WHERE (?1 IS NULL OR stream_id = ?1)
        ORDER BY end_date DESC
        "#,
    )?;

    let mut rows = stmt.query(params![stream_id.map(StreamId::as_str)])?;
    let mut dates = Vec::new();
    while let Some(row) = rows.next()? {
        let raw: String = row.get(0)?;
        dates.push(parse_date(&raw)?);
    }
    Ok(dates)
}

fn collect(rows: &mut rusqlite::Rows<'_>) -> Result<Vec<StoredRecord>> {
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(from_row(row)?);
    }
    Ok(records)
}

fn from_row(row: &Row<'_>) -> Result<StoredRecord> {
    let end_time: String = row.get(4)?;
    let recorded_at: String = row.get(5)?;

    Ok(StoredRecord {
        id: row.get(0)?,
        stream_id: StreamId::new(row.get::<_, String>(1)?),
        record: LogRecord::new(
            row.get(2)?,
            TimeDelta::milliseconds(row.get(3)?),
            parse_time(&end_time)?,
        ),
        recorded_at: parse_time(&recorded_at)?,
    })
}
