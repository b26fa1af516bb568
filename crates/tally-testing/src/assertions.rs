//! Assertions over `--format json` output.

use anyhow::{Context, Result};
use serde_json::Value;

/// Expected shape of one record: `(count, duration_secs, end_time)`.
pub type RecordShape<'a> = (u64, f64, &'a str);

fn records_of(json: &Value) -> Result<&Vec<Value>> {
    json.as_array()
        .or_else(|| json["records"].as_array())
        .context("Expected a records array in JSON")
}

pub fn assert_record_count(json: &Value, expected: usize) -> Result<()> {
    let records = records_of(json)?;
    if records.len() != expected {
        anyhow::bail!("Expected {} records, got {}", expected, records.len());
    }
    Ok(())
}

/// Compare count, duration and end time of every record, in order.
pub fn assert_records(json: &Value, expected: &[RecordShape<'_>]) -> Result<()> {
    assert_record_count(json, expected.len())?;

    for (i, (record, (count, secs, end))) in records_of(json)?.iter().zip(expected).enumerate() {
        let got_count = record["count"]
            .as_u64()
            .with_context(|| format!("Record {} missing count", i))?;
        let got_secs = record["duration_secs"]
            .as_f64()
            .with_context(|| format!("Record {} missing duration_secs", i))?;
        let got_end = record["end_time"]
            .as_str()
            .with_context(|| format!("Record {} missing end_time", i))?;

        if got_count != *count || (got_secs - secs).abs() > 1e-9 || got_end != *end {
            anyhow::bail!(
                "Record {}: expected ({}, {}, {}), got ({}, {}, {})",
                i,
                count,
                secs,
                end,
                got_count,
                got_secs,
                got_end
            );
        }
    }
    Ok(())
}

/// Every record belongs to `stream_id`.
pub fn assert_stream(json: &Value, stream_id: &str) -> Result<()> {
    for (i, record) in records_of(json)?.iter().enumerate() {
        let stream = record["stream_id"]
            .as_str()
            .with_context(|| format!("Record {} missing stream_id", i))?;
        if stream != stream_id {
            anyhow::bail!("Record {} is on stream {} but expected {}", i, stream, stream_id);
        }
    }
    Ok(())
}
