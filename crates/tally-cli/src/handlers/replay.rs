use crate::context::ExecutionContext;
use crate::views::{RecordView, ReplaySummaryView};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tally_runtime::{
    process_stream, DatabaseSink, FanoutSink, MemorySink, ReplaySource, SessionPipeline,
    SystemClock,
};
use tally_types::{LogRecord, StreamId};

#[derive(Serialize)]
struct ReplayOutput {
    records: Vec<LogRecord>,
    summary: ReplaySummaryView,
}

pub fn handle(
    ctx: &ExecutionContext,
    file: &Path,
    stream: Option<String>,
    store: bool,
    flush: bool,
) -> Result<()> {
    let config = ctx.config()?;
    let aggregator = config.aggregator.to_config()?;
    let stream_id = stream
        .map(StreamId::new)
        .unwrap_or_else(|| config.monitor.stream_id());

    let collected = MemorySink::new();
    let mut sink = FanoutSink::new().with(collected.clone());
    if store {
        sink = sink.with(DatabaseSink::new(ctx.open_db()?, stream_id.clone(), SystemClock));
    }

    let mut source = ReplaySource::open(file)?;
    let mut pipeline = SessionPipeline::new(stream_id.clone(), aggregator, sink);
    process_stream(&mut source, &mut pipeline, None)
        .with_context(|| format!("replay of {} stopped", file.display()))?;

    if flush {
        // Failures are already counted and logged by the pipeline.
        let _ = pipeline.flush();
    }

    let summary = ReplaySummaryView {
        stream_id,
        stored: store,
        stats: pipeline.stats(),
    };
    let records = collected.records();

    if ctx.is_json() {
        return super::print_json(&ReplayOutput { records, summary });
    }

    for record in &records {
        println!("{}", RecordView::new(record, ctx.palette));
    }
    println!("{}", ctx.palette.dim(summary));
    Ok(())
}
