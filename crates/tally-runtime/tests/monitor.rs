//! End-to-end runs of the sampling and processing threads.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::io::Cursor;
use std::time::Duration;
use tally_engine::AggregatorConfig;
use tally_index::Database;
use tally_runtime::{
    process_stream, ClockedSource, DatabaseSink, DetectorSource, Error, FanoutSink, IterSource,
    LogSink, ManualClock, MemorySink, MonitorEvent, MonitorSettings, ReplaySource, Result,
    SessionMonitor, SessionPipeline,
};
use tally_types::{LogRecord, Sample, StreamId};
use tempfile::TempDir;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

fn per_second(runs: &[(u32, i64)]) -> Vec<Sample> {
    let mut samples = Vec::new();
    let mut secs = 0;
    for &(count, len) in runs {
        for _ in 0..len {
            samples.push(Sample::new(t0() + TimeDelta::seconds(secs), count));
            secs += 1;
        }
    }
    samples
}

fn collect(monitor: &SessionMonitor) -> Vec<MonitorEvent> {
    monitor.receiver().iter().collect()
}

fn records(events: &[MonitorEvent]) -> Vec<LogRecord> {
    events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::Record(record) => Some(*record),
            _ => None,
        })
        .collect()
}

struct FailingSource;

impl DetectorSource for FailingSource {
    fn next_sample(&mut self) -> Result<Option<Sample>> {
        Err(Error::Source("camera offline".to_string()))
    }
}

struct RefusingSink;

impl LogSink for RefusingSink {
    fn record(&mut self, _log: &LogRecord) -> Result<()> {
        Err(Error::Sink("disk full".to_string()))
    }
}

#[test]
fn test_monitor_emits_records_then_stops() {
    // Three birds for 20s, one leaves and stays gone, then the scene empties.
    let samples = per_second(&[(3, 20), (2, 20), (0, 8)]);
    let sink = MemorySink::new();
    let monitor = SessionMonitor::start(
        IterSource::new(samples),
        sink.clone(),
        AggregatorConfig::default(),
        &MonitorSettings::default(),
    )
    .unwrap();

    let events = collect(&monitor);
    let stats = monitor.join().unwrap();

    let logged = records(&events);
    assert_eq!(logged.len(), 2);
    assert_eq!(logged[0].count, 3);
    assert_eq!(logged[0].duration, TimeDelta::seconds(20));
    assert_eq!(logged[0].end_time, t0() + TimeDelta::seconds(20));
    assert_eq!(logged[1].count, 2);
    assert_eq!(logged[1].start_time(), t0() + TimeDelta::seconds(25));
    assert_eq!(logged[1].end_time, t0() + TimeDelta::seconds(39));
    assert_eq!(logged[1].duration, TimeDelta::seconds(14));
    assert_eq!(sink.records(), logged);

    let samples_seen = events
        .iter()
        .filter(|e| matches!(e, MonitorEvent::Sample { .. }))
        .count();
    assert_eq!(samples_seen, 48);
    assert_eq!(stats.samples, 48);
    assert_eq!(stats.records, 2);

    match events.last() {
        Some(MonitorEvent::Stopped { reason, stats: last }) => {
            assert_eq!(reason, "source exhausted");
            assert_eq!(*last, stats);
        }
        other => panic!("expected Stopped, got {:?}", other),
    }
}

#[test]
fn test_open_session_is_dropped_unless_flushed() {
    let samples = per_second(&[(1, 30)]);

    let monitor = SessionMonitor::start(
        IterSource::new(samples.clone()),
        MemorySink::new(),
        AggregatorConfig::default(),
        &MonitorSettings::default(),
    )
    .unwrap();
    assert!(records(&collect(&monitor)).is_empty());
    monitor.join().unwrap();

    let settings = MonitorSettings {
        flush_on_stop: true,
        ..MonitorSettings::default()
    };
    let monitor = SessionMonitor::start(
        IterSource::new(samples),
        MemorySink::new(),
        AggregatorConfig::default(),
        &settings,
    )
    .unwrap();
    let logged = records(&collect(&monitor));
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].duration, TimeDelta::seconds(29));
    assert_eq!(monitor.join().unwrap().records, 1);
}

#[test]
fn test_repeated_source_failures_stop_the_monitor() {
    let settings = MonitorSettings {
        max_source_errors: 3,
        ..MonitorSettings::default()
    };
    let monitor = SessionMonitor::start(
        FailingSource,
        MemorySink::new(),
        AggregatorConfig::default(),
        &settings,
    )
    .unwrap();

    let events = collect(&monitor);
    let failures = events
        .iter()
        .filter(|e| matches!(e, MonitorEvent::SourceFailed { .. }))
        .count();
    assert_eq!(failures, 3);
    assert!(matches!(
        events.last(),
        Some(MonitorEvent::Stopped { reason, .. }) if reason == "source failed 3 times in a row"
    ));
    assert_eq!(monitor.join().unwrap().samples, 0);
}

#[test]
fn test_stop_ends_a_live_source() {
    let clock = ManualClock::new(t0());
    let probe_clock = clock.clone();
    let source = ClockedSource::new(clock, move || {
        probe_clock.advance(TimeDelta::seconds(1));
        Ok(Some(1))
    })
    .with_interval(Duration::from_millis(5));

    let monitor = SessionMonitor::start(
        source,
        MemorySink::new(),
        AggregatorConfig::default(),
        &MonitorSettings::default(),
    )
    .unwrap();

    // Wait for the feed to be live before asking it to stop.
    let first = monitor.receiver().recv().unwrap();
    assert!(matches!(first, MonitorEvent::Sample { .. }));
    monitor.stop();

    let rest = collect(&monitor);
    assert!(matches!(
        rest.last(),
        Some(MonitorEvent::Stopped { reason, .. }) if reason == "stop requested"
    ));
    assert!(monitor.join().unwrap().samples >= 1);
}

#[test]
fn test_records_reach_the_database() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("tally.db");
    let stream = StreamId::new("feeder");

    let csv = "time,count\n\
               2025-06-01T08:00:00Z,2\n\
               2025-06-01T08:00:15Z,2\n\
               2025-06-01T08:00:20Z,0\n";
    let clock = ManualClock::new(t0() + TimeDelta::minutes(5));
    let memory = MemorySink::new();
    let sink = FanoutSink::new()
        .with(DatabaseSink::new(
            Database::open(&db_path).unwrap(),
            stream.clone(),
            clock,
        ))
        .with(memory.clone());
    let mut pipeline = SessionPipeline::new(stream.clone(), AggregatorConfig::default(), sink);
    let mut source = ReplaySource::from_reader(Cursor::new(csv));

    process_stream(&mut source, &mut pipeline, None).unwrap();
    assert_eq!(pipeline.stats().records, 1);
    drop(pipeline);

    let db = Database::open(&db_path).unwrap();
    let stored = db.list_records(Some(&stream), 10).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].record, memory.records()[0]);
    assert_eq!(stored[0].record.count, 2);
    assert_eq!(stored[0].record.duration, TimeDelta::seconds(15));
    assert_eq!(stored[0].recorded_at, t0() + TimeDelta::minutes(5));
}

#[test]
fn test_replay_errors_abort_synchronous_run() {
    let csv = "time,count\n\
               2025-06-01T08:00:00Z,2\n\
               2025-06-01T08:00:01Z,-1\n";
    let mut pipeline = SessionPipeline::new(
        StreamId::default(),
        AggregatorConfig::default(),
        MemorySink::new(),
    );
    let mut source = ReplaySource::from_reader(Cursor::new(csv));

    let err = process_stream(&mut source, &mut pipeline, None).unwrap_err();
    assert!(err.to_string().contains("line 3"), "{}", err);
    assert_eq!(pipeline.stats().samples, 1);
}

#[test]
fn test_sink_failure_is_reported_and_counted() {
    // Two birds for 15s, then silence long enough to close the session.
    let samples = per_second(&[(2, 15), (0, 6)]);
    let monitor = SessionMonitor::start(
        IterSource::new(samples),
        RefusingSink,
        AggregatorConfig::default(),
        &MonitorSettings::default(),
    )
    .unwrap();

    let events = collect(&monitor);
    let stats = monitor.join().unwrap();

    let failed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::SinkFailed { record, error } => Some((*record, error.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(failed.len(), 1);
    let (record, error) = &failed[0];
    assert_eq!(record.count, 2);
    assert_eq!(record.duration, TimeDelta::seconds(14));
    assert!(error.contains("disk full"), "{}", error);
    assert!(records(&events).is_empty());

    // Finalized sessions are counted whether or not the sink took them.
    assert_eq!(stats.records, 1);
    assert_eq!(stats.sink_failures, 1);
    match events.last() {
        Some(MonitorEvent::Stopped { reason, stats: last }) => {
            assert_eq!(reason, "source exhausted");
            assert_eq!(last.sink_failures, 1);
            assert_eq!(*last, stats);
        }
        other => panic!("expected Stopped, got {:?}", other),
    }
}

#[test]
fn test_sample_from_the_past_is_rejected_and_monitor_continues() {
    let mut samples = per_second(&[(1, 12)]);
    samples.insert(6, Sample::new(t0() + TimeDelta::seconds(2), 1));

    let monitor = SessionMonitor::start(
        IterSource::new(samples),
        MemorySink::new(),
        AggregatorConfig::default(),
        &MonitorSettings::default(),
    )
    .unwrap();

    let events = collect(&monitor);
    let stats = monitor.join().unwrap();

    let rejected: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            MonitorEvent::Rejected { sample, .. } => Some(*sample),
            _ => None,
        })
        .collect();
    assert_eq!(rejected, vec![Sample::new(t0() + TimeDelta::seconds(2), 1)]);

    let accepted = events
        .iter()
        .filter(|e| matches!(e, MonitorEvent::Sample { .. }))
        .count();
    assert_eq!(accepted, 12);
    assert_eq!(stats.rejected, 1);
    assert!(matches!(
        events.last(),
        Some(MonitorEvent::Stopped { stats: last, .. }) if last.rejected == 1
    ));
}
