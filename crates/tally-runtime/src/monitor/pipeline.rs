use serde::Serialize;
use std::sync::mpsc::Sender;
use tally_engine::{AggregatorConfig, Outcome, SessionAggregator, Transition};
use tally_types::{format_duration, LogRecord, Sample, StreamId};

use super::MonitorEvent;
use crate::{DetectorSource, Error, LogSink, Result};

/// Counters kept by the processing loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub samples: u64,
    pub rejected: u64,
    pub records: u64,
    pub discarded: u64,
    pub sink_failures: u64,
}

/// Result of handing one sample to the pipeline.
#[derive(Debug)]
pub struct Handled {
    pub outcome: Outcome,
    /// Set when a record was produced but the sink refused it.
    pub sink_error: Option<Error>,
}

/// One stream's aggregator wired to its sink.
///
/// Decides with the engine, then performs the effect through the sink. Sink
/// failures are counted and logged but never roll back the aggregator.
pub struct SessionPipeline<S> {
    stream_id: StreamId,
    aggregator: SessionAggregator,
    sink: S,
    stats: PipelineStats,
}

impl<S: LogSink> SessionPipeline<S> {
    pub fn new(stream_id: StreamId, config: AggregatorConfig, sink: S) -> Self {
        Self {
            stream_id,
            aggregator: SessionAggregator::new(config),
            sink,
            stats: PipelineStats::default(),
        }
    }

    pub fn stream_id(&self) -> &StreamId {
        &self.stream_id
    }

    pub fn aggregator(&self) -> &SessionAggregator {
        &self.aggregator
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process one sample. Errors only when the sample itself is rejected.
    pub fn handle(&mut self, sample: Sample) -> Result<Handled> {
        let outcome = match self.aggregator.step(sample) {
            Ok(outcome) => outcome,
            Err(err) => {
                self.stats.rejected += 1;
                tracing::warn!(stream = %self.stream_id, error = %err, "sample rejected");
                return Err(err.into());
            }
        };
        self.stats.samples += 1;
        self.log_transition(&outcome);

        let sink_error = outcome.record.and_then(|record| self.deliver(&record).err());
        Ok(Handled {
            outcome,
            sink_error,
        })
    }

    /// Close the open session (if any) and deliver it when long enough.
    /// A session too short to log is counted as discarded.
    pub fn flush(&mut self) -> Option<(LogRecord, Option<Error>)> {
        let outcome = self.aggregator.flush_outcome()?;
        self.log_transition(&outcome);

        let record = outcome.record?;
        tracing::info!(
            stream = %self.stream_id,
            count = record.count,
            duration = %format_duration(record.duration),
            "open session flushed"
        );
        let error = self.deliver(&record).err();
        Some((record, error))
    }

    pub fn into_parts(self) -> (PipelineStats, S) {
        (self.stats, self.sink)
    }

    fn deliver(&mut self, record: &LogRecord) -> Result<()> {
        self.stats.records += 1;
        tracing::info!(
            stream = %self.stream_id,
            count = record.count,
            duration = %format_duration(record.duration),
            end_time = %record.end_time,
            "session recorded"
        );

        self.sink.record(record).inspect_err(|err| {
            self.stats.sink_failures += 1;
            tracing::warn!(stream = %self.stream_id, error = %err, "sink failed to accept record");
        })
    }

    fn log_transition(&mut self, outcome: &Outcome) {
        match outcome.transition {
            Transition::Started { count } => {
                tracing::info!(stream = %self.stream_id, count, "session started");
            }
            Transition::ReductionConfirmed { from, to } => {
                tracing::info!(stream = %self.stream_id, from, to, "count drop confirmed");
            }
            Transition::Ended { count } => {
                tracing::info!(stream = %self.stream_id, count, "session ended");
            }
            _ => {}
        }

        if outcome.discarded() {
            self.stats.discarded += 1;
            tracing::debug!(stream = %self.stream_id, "short session discarded");
        }
    }
}

/// Drive `source` to exhaustion through `pipeline`, synchronously.
///
/// Source errors abort the run. Rejected samples are skipped. When `events` is
/// given, the live feed is published on it.
pub fn process_stream<Src, S>(
    source: &mut Src,
    pipeline: &mut SessionPipeline<S>,
    events: Option<&Sender<MonitorEvent>>,
) -> Result<()>
where
    Src: DetectorSource + ?Sized,
    S: LogSink,
{
    while let Some(sample) = source.next_sample()? {
        let event = handle_and_describe(pipeline, sample);
        if let Some(tx) = events {
            for event in event {
                let _ = tx.send(event);
            }
        }
    }
    Ok(())
}

/// Handle one sample and turn the result into feed events.
pub(super) fn handle_and_describe<S: LogSink>(
    pipeline: &mut SessionPipeline<S>,
    sample: Sample,
) -> Vec<MonitorEvent> {
    match pipeline.handle(sample) {
        Ok(handled) => {
            let mut events = vec![MonitorEvent::Sample {
                sample,
                transition: handled.outcome.transition,
            }];
            if let Some(record) = handled.outcome.record {
                events.push(match handled.sink_error {
                    Some(err) => MonitorEvent::SinkFailed {
                        record,
                        error: err.to_string(),
                    },
                    None => MonitorEvent::Record(record),
                });
            }
            events
        }
        Err(err) => vec![MonitorEvent::Rejected {
            sample,
            reason: err.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IterSource, MemorySink};
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use std::sync::mpsc::channel;

    fn at(secs: i64, count: u32) -> Sample {
        let t0: DateTime<Utc> = Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap();
        Sample::new(t0 + TimeDelta::seconds(secs), count)
    }

    fn pipeline_with<S: LogSink>(sink: S) -> SessionPipeline<S> {
        SessionPipeline::new(StreamId::default(), AggregatorConfig::default(), sink)
    }

    struct FlakySink {
        fail_next: bool,
        accepted: Vec<LogRecord>,
    }

    impl LogSink for FlakySink {
        fn record(&mut self, log: &LogRecord) -> Result<()> {
            if std::mem::take(&mut self.fail_next) {
                return Err(Error::Sink("connection reset".to_string()));
            }
            self.accepted.push(*log);
            Ok(())
        }
    }

    #[test]
    fn sink_failure_does_not_roll_back_aggregator() {
        let sink = FlakySink {
            fail_next: true,
            accepted: Vec::new(),
        };
        let mut pipeline = pipeline_with(sink);

        for (secs, count) in [(0, 2), (15, 2), (20, 0)] {
            pipeline.handle(at(secs, count)).unwrap();
        }
        assert!(pipeline.aggregator().is_idle());
        assert_eq!(pipeline.stats().sink_failures, 1);
        assert_eq!(pipeline.stats().records, 1);

        // The next session still reaches the sink.
        for (secs, count) in [(30, 1), (45, 1), (50, 0)] {
            pipeline.handle(at(secs, count)).unwrap();
        }
        let (stats, sink) = pipeline.into_parts();
        assert_eq!(stats.records, 2);
        assert_eq!(sink.accepted.len(), 1);
        assert_eq!(sink.accepted[0].count, 1);
    }

    #[test]
    fn rejected_sample_is_counted_and_skipped() {
        let mut pipeline = pipeline_with(MemorySink::new());

        pipeline.handle(at(10, 1)).unwrap();
        assert!(matches!(pipeline.handle(at(5, 1)), Err(Error::Types(_))));
        assert_eq!(pipeline.stats().rejected, 1);
        assert_eq!(pipeline.stats().samples, 1);
    }

    #[test]
    fn process_stream_publishes_feed() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline_with(sink.clone());
        let mut source =
            IterSource::new(vec![at(0, 3), at(3, 1), at(12, 3), at(13, 0), at(18, 0)]);
        let (tx, rx) = channel();

        process_stream(&mut source, &mut pipeline, Some(&tx)).unwrap();
        drop(tx);

        let events: Vec<MonitorEvent> = rx.iter().collect();
        assert_eq!(events.len(), 6);
        assert_eq!(
            events[0],
            MonitorEvent::Sample {
                sample: at(0, 3),
                transition: Transition::Started { count: 3 }
            }
        );
        assert_eq!(
            events[2],
            MonitorEvent::Sample {
                sample: at(12, 3),
                transition: Transition::Recovered { count: 3 }
            }
        );
        let record = match &events[5] {
            MonitorEvent::Record(record) => *record,
            other => panic!("expected record, got {:?}", other),
        };
        assert_eq!(record.count, 3);
        assert_eq!(record.duration, TimeDelta::seconds(12));
        assert_eq!(sink.records(), vec![record]);
    }

    #[test]
    fn flush_delivers_open_session() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline_with(sink.clone());
        pipeline.handle(at(0, 2)).unwrap();
        pipeline.handle(at(11, 2)).unwrap();

        let (record, error) = pipeline.flush().unwrap();
        assert!(error.is_none());
        assert_eq!(record.duration, TimeDelta::seconds(11));
        assert_eq!(sink.records().len(), 1);
        assert!(pipeline.flush().is_none());
    }

    #[test]
    fn flush_counts_short_session_as_discarded() {
        let sink = MemorySink::new();
        let mut pipeline = pipeline_with(sink.clone());
        pipeline.handle(at(0, 2)).unwrap();
        pipeline.handle(at(3, 2)).unwrap();

        assert!(pipeline.flush().is_none());
        assert_eq!(pipeline.stats().discarded, 1);
        assert_eq!(pipeline.stats().records, 0);
        assert!(sink.records().is_empty());
        assert!(pipeline.aggregator().is_idle());

        // Nothing left to close.
        assert!(pipeline.flush().is_none());
        assert_eq!(pipeline.stats().discarded, 1);
    }
}
