use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use std::path::Path;
use tally_types::{LogRecord, StreamId};

use crate::queries::{record, stats};
use crate::{schema, DetectionStats, Result, StoredRecord};

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the store at `db_path`, migrating the schema.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Append a finalized session. Returns the new row id.
    pub fn insert_record(
        &self,
        stream_id: &StreamId,
        log: &LogRecord,
        recorded_at: DateTime<Utc>,
    ) -> Result<i64> {
        record::insert(&self.conn, stream_id, log, recorded_at)
    }

    pub fn get_record(&self, id: i64) -> Result<Option<StoredRecord>> {
        record::get_by_id(&self.conn, id)
    }

    pub fn list_records(
        &self,
        stream_id: Option<&StreamId>,
        limit: usize,
    ) -> Result<Vec<StoredRecord>> {
        record::list(&self.conn, stream_id, limit)
    }

    pub fn records_on(
        &self,
        date: NaiveDate,
        stream_id: Option<&StreamId>,
    ) -> Result<Vec<StoredRecord>> {
        record::on_date(&self.conn, date, stream_id)
    }

    pub fn available_dates(&self, stream_id: Option<&StreamId>) -> Result<Vec<NaiveDate>> {
        record::dates(&self.conn, stream_id)
    }

    pub fn stats(&self, today: NaiveDate, stream_id: Option<&StreamId>) -> Result<DetectionStats> {
        stats::for_date(&self.conn, today, stream_id)
    }

    pub fn vacuum(&self) -> Result<()> {
        self.conn.execute_batch("VACUUM")?;
        Ok(())
    }
}
