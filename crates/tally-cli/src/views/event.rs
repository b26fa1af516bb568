use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tally_engine::Transition;
use tally_runtime::{MonitorEvent, PipelineStats};

use super::{Palette, RecordView};

/// Short human label for what a sample did to the session.
pub fn describe_transition(transition: &Transition) -> String {
    match *transition {
        Transition::Idle => "idle".to_string(),
        Transition::Started { count } => format!("session started with {}", count),
        Transition::Raised { from, to } => format!("raised {} -> {}", from, to),
        Transition::Steady { count } => format!("steady at {}", count),
        Transition::Recovered { count } => format!("recovered to {}", count),
        Transition::ReductionPending {
            candidate,
            observed,
        } => format!("drop {} -> {} pending", candidate, observed),
        Transition::ReductionWaiting {
            candidate,
            observed,
        } => format!("drop {} -> {} waiting", candidate, observed),
        Transition::ReductionConfirmed { from, to } => {
            format!("drop {} -> {} confirmed", from, to)
        }
        Transition::Gap => "gap".to_string(),
        Transition::Ended { count } => format!("session of {} ended", count),
    }
}

/// One line of `tally monitor --format json`.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventViewModel {
    Sample {
        time: DateTime<Utc>,
        count: u32,
        state: String,
    },
    Record {
        count: u32,
        duration_secs: f64,
        end_time: DateTime<Utc>,
    },
    Rejected {
        time: DateTime<Utc>,
        count: u32,
        reason: String,
    },
    SinkFailed {
        count: u32,
        end_time: DateTime<Utc>,
        error: String,
    },
    SourceFailed {
        error: String,
    },
    Stopped {
        reason: String,
        stats: PipelineStats,
    },
}

impl From<&MonitorEvent> for EventViewModel {
    fn from(event: &MonitorEvent) -> Self {
        match event {
            MonitorEvent::Sample { sample, transition } => Self::Sample {
                time: sample.time,
                count: sample.count,
                state: describe_transition(transition),
            },
            MonitorEvent::Record(record) => Self::Record {
                count: record.count,
                duration_secs: record.duration.num_milliseconds() as f64 / 1000.0,
                end_time: record.end_time,
            },
            MonitorEvent::Rejected { sample, reason } => Self::Rejected {
                time: sample.time,
                count: sample.count,
                reason: reason.clone(),
            },
            MonitorEvent::SinkFailed { record, error } => Self::SinkFailed {
                count: record.count,
                end_time: record.end_time,
                error: error.clone(),
            },
            MonitorEvent::SourceFailed { error } => Self::SourceFailed {
                error: error.clone(),
            },
            MonitorEvent::Stopped { reason, stats } => Self::Stopped {
                reason: reason.clone(),
                stats: *stats,
            },
        }
    }
}

pub struct EventView<'a> {
    event: &'a MonitorEvent,
    palette: Palette,
}

impl<'a> EventView<'a> {
    pub fn new(event: &'a MonitorEvent, palette: Palette) -> Self {
        Self { event, palette }
    }
}

impl fmt::Display for EventView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.palette;
        match self.event {
            MonitorEvent::Sample { sample, transition } => write!(
                f,
                "{}  count={}  {}",
                p.dim(sample.time.format("%H:%M:%S")),
                sample.count,
                p.dim(describe_transition(transition))
            ),
            MonitorEvent::Record(record) => {
                write!(f, "{} {}", p.good("logged"), RecordView::new(record, *p))
            }
            MonitorEvent::Rejected { sample, reason } => write!(
                f,
                "{} count={} at {}: {}",
                p.warn("rejected"),
                sample.count,
                sample.time,
                reason
            ),
            MonitorEvent::SinkFailed { record, error } => write!(
                f,
                "{} {}: {}",
                p.bad("not stored"),
                RecordView::new(record, *p),
                error
            ),
            MonitorEvent::SourceFailed { error } => {
                write!(f, "{} {}", p.bad("source error"), error)
            }
            MonitorEvent::Stopped { reason, stats } => write!(
                f,
                "stopped ({}): {} samples, {} records",
                reason, stats.samples, stats.records
            ),
        }
    }
}
