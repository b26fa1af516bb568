use crate::context::ExecutionContext;
use crate::views::{StatsView, StoredRecordView};
use anyhow::Result;
use chrono::{NaiveDate, Utc};
use tally_index::StoredRecord;
use tally_types::StreamId;

pub fn list(ctx: &ExecutionContext, stream: Option<String>, limit: usize) -> Result<()> {
    let stream = stream.map(StreamId::new);
    let records = ctx.db()?.list_records(stream.as_ref(), limit)?;
    print_records(ctx, &records, "No records yet.")
}

pub fn day(ctx: &ExecutionContext, date: NaiveDate, stream: Option<String>) -> Result<()> {
    let stream = stream.map(StreamId::new);
    let records = ctx.db()?.records_on(date, stream.as_ref())?;
    print_records(ctx, &records, &format!("No records on {}.", date))
}

pub fn dates(ctx: &ExecutionContext, stream: Option<String>) -> Result<()> {
    let stream = stream.map(StreamId::new);
    let dates = ctx.db()?.available_dates(stream.as_ref())?;

    if ctx.is_json() {
        return super::print_json(&dates);
    }
    for date in &dates {
        println!("{}", date);
    }
    Ok(())
}

pub fn stats(
    ctx: &ExecutionContext,
    date: Option<NaiveDate>,
    stream: Option<String>,
) -> Result<()> {
    let stream = stream.map(StreamId::new);
    let date = date.unwrap_or_else(|| Utc::now().date_naive());
    let stats = ctx.db()?.stats(date, stream.as_ref())?;

    if ctx.is_json() {
        return super::print_json(&stats);
    }
    println!("{}", StatsView::new(&stats, ctx.palette));
    Ok(())
}

pub fn vacuum(ctx: &ExecutionContext) -> Result<()> {
    ctx.db()?.vacuum()?;
    if !ctx.is_json() {
        println!("Compacted {}", ctx.db_path().display());
    }
    Ok(())
}

fn print_records(ctx: &ExecutionContext, records: &[StoredRecord], empty: &str) -> Result<()> {
    if ctx.is_json() {
        return super::print_json(records);
    }
    if records.is_empty() {
        println!("{}", ctx.palette.dim(empty));
        return Ok(());
    }
    for record in records {
        println!("{}", StoredRecordView::new(record, ctx.palette));
    }
    Ok(())
}
