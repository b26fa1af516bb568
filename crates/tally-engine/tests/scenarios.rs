use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use tally_engine::{aggregate, AggregatorConfig, SessionAggregator, Transition};
use tally_types::{format_duration, LogRecord, Sample};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

/// Expand `(from_secs, to_secs, count)` runs into one sample per second.
fn per_second(runs: &[(i64, i64, u32)]) -> Vec<Sample> {
    runs.iter()
        .flat_map(|&(from, to, count)| {
            (from..to).map(move |secs| Sample::new(t0() + TimeDelta::seconds(secs), count))
        })
        .collect()
}

fn render(records: &[LogRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "count={} duration={} start=+{}s end=+{}s",
                r.count,
                format_duration(r.duration),
                (r.start_time() - t0()).num_seconds(),
                (r.end_time - t0()).num_seconds()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_flock_arrives_shrinks_and_leaves() {
    // Three birds land, one flickers out briefly, two fly off for good,
    // the last one stays a while and leaves.
    let samples = per_second(&[
        (0, 20, 3),
        (20, 22, 2),  // flicker, forgiven
        (22, 40, 3),
        (40, 70, 1),  // sustained drop
        (70, 80, 0),  // gone
    ]);

    let records = aggregate(AggregatorConfig::default(), samples);

    insta::assert_snapshot!(render(&records), @r"
    count=3 duration=40s start=+0s end=+40s
    count=1 duration=24s start=+45s end=+69s
    ");
}

#[test]
fn test_momentary_detections_never_reach_the_log() {
    let samples = per_second(&[
        (0, 3, 1),
        (3, 20, 0),
        (20, 28, 2),
        (28, 40, 0),
    ]);

    let records = aggregate(AggregatorConfig::default(), samples);
    assert!(records.is_empty(), "unexpected records: {}", render(&records));
}

#[test]
fn test_detector_dropouts_are_bridged() {
    // Zero-count frames shorter than the silence window do not split a session.
    let samples = per_second(&[
        (0, 10, 2),
        (10, 13, 0),
        (13, 25, 2),
        (25, 27, 0),
        (27, 35, 2),
        (35, 45, 0),
    ]);

    let records = aggregate(AggregatorConfig::default(), samples);

    insta::assert_snapshot!(render(&records), @"count=2 duration=34s start=+0s end=+34s");
}

#[test]
fn test_growing_group_reports_peak_count() {
    let samples = per_second(&[
        (0, 5, 1),
        (5, 10, 2),
        (10, 15, 4),
        (15, 30, 0),
    ]);

    let records = aggregate(AggregatorConfig::default(), samples);

    insta::assert_snapshot!(render(&records), @"count=4 duration=14s start=+0s end=+14s");
}

#[test]
fn test_transition_trace_for_confirmed_reduction() {
    let mut aggregator = SessionAggregator::default();
    let at = |secs: i64, count: u32| Sample::new(t0() + TimeDelta::seconds(secs), count);

    let transitions: Vec<Transition> = [at(0, 3), at(12, 1), at(15, 1), at(18, 1), at(19, 2)]
        .into_iter()
        .map(|s| aggregator.step(s).unwrap().transition)
        .collect();

    assert_eq!(
        transitions,
        vec![
            Transition::Started { count: 3 },
            Transition::ReductionPending {
                candidate: 3,
                observed: 1
            },
            Transition::ReductionWaiting {
                candidate: 3,
                observed: 1
            },
            Transition::ReductionConfirmed { from: 3, to: 1 },
            Transition::Raised { from: 1, to: 2 },
        ]
    );
}
