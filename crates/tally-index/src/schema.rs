use rusqlite::Connection;

use crate::Result;

// Schema version (increment when changing table definitions)
pub const SCHEMA_VERSION: i32 = 1;

// Records are append-only: the aggregator never revises a finalized session,
// so there is no update path and no soft delete.
//
// end_date duplicates the UTC calendar date of end_time so per-day listings and
// daily totals stay index lookups.

pub fn init_schema(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    if current_version != SCHEMA_VERSION {
        drop_all_tables(conn)?;
    }

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log_records (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            stream_id TEXT NOT NULL,
            object_count INTEGER NOT NULL CHECK (object_count > 0),
            duration_ms INTEGER NOT NULL CHECK (duration_ms >= 0),
            end_time TEXT NOT NULL,
            end_date TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_records_stream_end ON log_records(stream_id, end_time DESC);
        CREATE INDEX IF NOT EXISTS idx_records_date ON log_records(end_date);
        "#,
    )?;

    conn.execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;

    Ok(())
}

fn drop_all_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DROP TABLE IF EXISTS log_records;
        "#,
    )?;
    Ok(())
}
