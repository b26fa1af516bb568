use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use tally_index::Database;
use tally_types::{LogRecord, StreamId};

use crate::{Clock, Error, Result};

/// Destination for finalized session records.
///
/// A failed `record` call is reported back to the processing loop, which logs
/// it and moves on; the aggregator has already committed the record and does
/// not retry.
pub trait LogSink: Send {
    fn record(&mut self, log: &LogRecord) -> Result<()>;
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn record(&mut self, log: &LogRecord) -> Result<()> {
        (**self).record(log)
    }
}

/// Persists records to the SQLite store, tagged with the stream id.
pub struct DatabaseSink<C> {
    db: Database,
    stream_id: StreamId,
    clock: C,
}

impl<C: Clock> DatabaseSink<C> {
    pub fn new(db: Database, stream_id: StreamId, clock: C) -> Self {
        Self {
            db,
            stream_id,
            clock,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl<C: Clock> LogSink for DatabaseSink<C> {
    fn record(&mut self, log: &LogRecord) -> Result<()> {
        let id = self
            .db
            .insert_record(&self.stream_id, log, self.clock.now())?;
        tracing::debug!(id, stream = %self.stream_id, "record stored");
        Ok(())
    }
}

/// Forwards records to a live subscriber.
pub struct ChannelSink {
    tx: Sender<LogRecord>,
}

impl ChannelSink {
    pub fn new(tx: Sender<LogRecord>) -> Self {
        Self { tx }
    }
}

impl LogSink for ChannelSink {
    fn record(&mut self, log: &LogRecord) -> Result<()> {
        self.tx
            .send(*log)
            .map_err(|_| Error::Sink("record subscriber has gone away".to_string()))
    }
}

/// Collects records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl LogSink for MemorySink {
    fn record(&mut self, log: &LogRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*log);
        Ok(())
    }
}

/// Delivers every record to each inner sink, in order.
///
/// One sink failing does not stop delivery to the others; the failures are
/// combined into a single error.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn LogSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl LogSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl LogSink for FanoutSink {
    fn record(&mut self, log: &LogRecord) -> Result<()> {
        let failures: Vec<String> = self
            .sinks
            .iter_mut()
            .filter_map(|sink| sink.record(log).err())
            .map(|e| e.to_string())
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Sink(failures.join("; ")))
        }
    }
}
