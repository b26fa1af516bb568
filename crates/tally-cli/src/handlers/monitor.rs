use crate::context::ExecutionContext;
use crate::views::{EventView, EventViewModel};
use anyhow::Result;
use std::io::BufRead;
use std::time::Duration;
use tally_runtime::{
    ClockedSource, DatabaseSink, Error, LogSink, MemorySink, SessionMonitor, SystemClock,
};

pub fn handle(
    ctx: &ExecutionContext,
    stream: Option<String>,
    interval_ms: Option<u64>,
    store: bool,
    flush: bool,
) -> Result<()> {
    let config = ctx.config()?;
    let aggregator = config.aggregator.to_config()?;

    let mut settings = config.monitor.clone();
    if let Some(stream) = stream {
        settings.stream_id = stream;
    }
    settings.flush_on_stop |= flush;
    let interval = Duration::from_millis(interval_ms.unwrap_or(settings.sample_interval_ms));

    let sink: Box<dyn LogSink> = if store {
        Box::new(DatabaseSink::new(ctx.open_db()?, settings.stream_id(), SystemClock))
    } else {
        Box::new(MemorySink::new())
    };

    let mut input = std::io::BufReader::new(std::io::stdin());
    let probe = move || read_count(&mut input);
    let source = ClockedSource::new(SystemClock, probe).with_interval(interval);

    let monitor = SessionMonitor::start(source, sink, aggregator, &settings)?;
    let stop = monitor.stop_handle();
    ctrlc::set_handler(move || stop.stop())?;

    for event in monitor.receiver().iter() {
        if ctx.is_json() {
            println!("{}", serde_json::to_string(&EventViewModel::from(&event))?);
        } else {
            println!("{}", EventView::new(&event, ctx.palette));
        }
    }

    monitor.join()?;
    Ok(())
}

/// Next count from a line-oriented reader. Blank lines and `#` comments are
/// skipped; end of input ends the stream.
fn read_count<R: BufRead>(input: &mut R) -> tally_runtime::Result<Option<i64>> {
    let mut line = String::new();
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        return trimmed
            .parse()
            .map(Some)
            .map_err(|_| Error::Source(format!("not a count: {:?}", trimmed)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_count_skips_blank_and_comment_lines() {
        let mut input = Cursor::new("3\n\n# lights off\n 0 \n");
        assert_eq!(read_count(&mut input).unwrap(), Some(3));
        assert_eq!(read_count(&mut input).unwrap(), Some(0));
        assert_eq!(read_count(&mut input).unwrap(), None);
    }

    #[test]
    fn test_read_count_rejects_garbage() {
        let mut input = Cursor::new("three\n");
        assert!(matches!(read_count(&mut input), Err(Error::Source(_))));
    }
}
